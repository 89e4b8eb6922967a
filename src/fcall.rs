//! 9P protocol data types and constants.
//!
//! # Protocol
//! 9P2000

use std::mem::{size_of, size_of_val};

use bitflags::bitflags;
use enum_primitive::*;

/// 9P2000 version string
pub const P92000: &str = "9P2000";

/// Bare 9P version string, the smallest dialect this crate speaks
pub const P9: &str = "9P";

/// The version string that comes with an RVersion when the server does not
/// understand the client's version string
pub const VERSION_UNKNOWN: &str = "unknown";

/*
 * 9P magic numbers
 */
/// Special tag which `TVersion`/`RVersion` must use as `tag`
pub const NOTAG: u16 = !0;

/// Special value which `TAttach` with no auth must use as `afid`
///
/// If the client does not wish to authenticate the connection, or knows that
/// authentication is not required, the afid field in the attach message
/// should be set to `NOFID`
pub const NOFID: u32 = !0;

/// Maximum number of path elements a single walk may carry
pub const MAXWELEM: usize = 16;

/// Ample room for `TWrite`/`RRead` header
///
/// size[4] TRead/TWrite[1] tag[2] fid[4] offset[8] count[4]
pub const IOHDRSZ: u32 = 24;

/// Default maximum frame size offered during version negotiation
pub const DEFAULT_MSIZE: u32 = 8 * 1024 + IOHDRSZ;

/// The type of I/O
///
/// Open mode to be checked against the permissions for the file.
pub mod om {
    /// Open for read
    pub const READ: u8 = 0;
    /// Write
    pub const WRITE: u8 = 1;
    /// Read and write
    pub const RDWR: u8 = 2;
    /// Execute, == read but check execute permission
    pub const EXEC: u8 = 3;
    /// Or'ed in (except for exec), truncate file first
    pub const TRUNC: u8 = 16;
    /// Or'ed in, close on exec
    pub const CEXEC: u8 = 32;
    /// Or'ed in, remove on close
    pub const RCLOSE: u8 = 64;
}

/// Bits in Stat.mode
pub mod dm {
    /// Mode bit for directories
    pub const DIR: u32 = 0x80000000;
    /// Mode bit for append only files
    pub const APPEND: u32 = 0x40000000;
    /// Mode bit for exclusive use files
    pub const EXCL: u32 = 0x20000000;
    /// Mode bit for mounted channel
    pub const MOUNT: u32 = 0x10000000;
    /// Mode bit for authentication file
    pub const AUTH: u32 = 0x08000000;
    /// Mode bit for non-backed-up files
    pub const TMP: u32 = 0x04000000;
    /// Mode bit for read permission
    pub const READ: u32 = 0x4;
    /// Mode bit for write permission
    pub const WRITE: u32 = 0x2;
    /// Mode bit for execute permission
    pub const EXEC: u32 = 0x1;
}

bitflags! {
    /// Bits in QId.typ
    #[derive(Copy, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord)]
    pub struct QIdType: u8 {
        #[doc = "Type bit for directories"]
        const DIR       = 0x80;
        #[doc = "Type bit for append only files"]
        const APPEND    = 0x40;
        #[doc = "Type bit for exclusive use files"]
        const EXCL      = 0x20;
        #[doc = "Type bit for mounted channel"]
        const MOUNT     = 0x10;
        #[doc = "Type bit for authentication file"]
        const AUTH      = 0x08;
        #[doc = "Type bit for not-backed-up file"]
        const TMP       = 0x04;
        #[doc = "Plain file"]
        const FILE      = 0x00;
    }
}

/// Server side data type for path tracking
///
/// The server's unique identification for the file being accessed. Two
/// files on the same server hierarchy are the same if and only if their
/// qid paths are equal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct QId {
    /// Specify whether the file is a directory, append-only file, etc.
    pub typ: QIdType,
    /// Version number for a file; typically, it is incremented every time
    /// the file is modified
    pub version: u32,
    /// An integer which is unique among all files in the hierarchy
    pub path: u64,
}

impl QId {
    /// Number of bytes a qid occupies on the wire.
    pub fn size(&self) -> u32 {
        (size_of::<u8>() + size_of::<u32>() + size_of::<u64>()) as u32
    }
}

/// Plan 9 namespace metadata (somewhat like a unix fstat)
///
/// NOTE: Defined as `Dir` in libc.h of Plan 9
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stat {
    /// Server type
    pub typ: u16,
    /// Server subtype
    pub dev: u32,
    /// Unique id from server
    pub qid: QId,
    /// Permissions
    pub mode: u32,
    /// Last read time
    pub atime: u32,
    /// Last write time
    pub mtime: u32,
    /// File length
    pub length: u64,
    /// Last element of path
    pub name: String,
    /// Owner name
    pub uid: String,
    /// Group name
    pub gid: String,
    /// Last modifier name
    pub muid: String,
}

impl Stat {
    /// Get the current size of the stat, excluding its own leading size
    /// field
    pub fn size(&self) -> u16 {
        (size_of_val(&self.typ)
            + size_of_val(&self.dev)
            + self.qid.size() as usize
            + size_of_val(&self.mode)
            + size_of_val(&self.atime)
            + size_of_val(&self.mtime)
            + size_of_val(&self.length)
            + (size_of::<u16>() * 4)
            + self.name.len()
            + self.uid.len()
            + self.gid.len()
            + self.muid.len()) as u16
    }
}

/// Data type used in `RRead` and `TWrite`
///
/// Read/write payloads carry a 32-bit count on the wire, unlike every
/// other sequence in the protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Data(pub Vec<u8>);

enum_from_primitive! {
    #[doc = "Message type, 9P2000 operations"]
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub enum MsgType {
        TVersion        = 100,
        RVersion,
        TAuth           = 102,
        RAuth,
        TAttach         = 104,
        RAttach,
        TError          = 106,  // Illegal on the wire, kept for regularity
        RError,
        TFlush          = 108,
        RFlush,
        TWalk           = 110,
        RWalk,
        TOpen           = 112,
        ROpen,
        TCreate         = 114,
        RCreate,
        TRead           = 116,
        RRead,
        TWrite          = 118,
        RWrite,
        TClunk          = 120,
        RClunk,
        TRemove         = 122,
        RRemove,
        TStat           = 124,
        RStat,
        TWStat          = 126,
        RWStat,

        // Sentinels for "no operation at all"; the parity rule still holds
        TBad            = 0xfe,
        RBad            = 0xff,
    }
}

impl MsgType {
    /// If the message type is T-message
    ///
    /// Every request opcode is even and its response is the next odd
    /// value, so direction is a parity test.
    pub fn is_t(&self) -> bool {
        (*self as u8) & 1 == 0
    }

    /// If the message type is R-message
    pub fn is_r(&self) -> bool {
        !self.is_t()
    }

    /// Strip the transmit/receive distinction.
    pub fn kind(&self) -> MsgKind {
        use crate::MsgType::*;

        match *self {
            TVersion | RVersion => MsgKind::Version,
            TAuth | RAuth => MsgKind::Auth,
            TAttach | RAttach => MsgKind::Attach,
            TError | RError => MsgKind::Error,
            TFlush | RFlush => MsgKind::Flush,
            TWalk | RWalk => MsgKind::Walk,
            TOpen | ROpen => MsgKind::Open,
            TCreate | RCreate => MsgKind::Create,
            TRead | RRead => MsgKind::Read,
            TWrite | RWrite => MsgKind::Write,
            TClunk | RClunk => MsgKind::Clunk,
            TRemove | RRemove => MsgKind::Remove,
            TStat | RStat => MsgKind::Stat,
            TWStat | RWStat => MsgKind::WStat,
            TBad | RBad => MsgKind::Undefined,
        }
    }

    /// The response type a peer should expect after sending this message.
    ///
    /// T-forms map to their paired R-form. R-forms map to `RError` (there
    /// is nothing to wait for) and the sentinels to `RBad`.
    pub fn expected_response(&self) -> MsgType {
        match *self {
            MsgType::TBad | MsgType::RBad => MsgType::RBad,
            t if t.is_t() => t.kind().r_form(),
            _ => MsgType::RError,
        }
    }

    /// Version, attach, and the other session-scoped operations.
    pub fn is_session_class(&self) -> bool {
        self.kind().is_session_class()
    }

    /// Operations that act on a file handle's contents.
    pub fn is_file_class(&self) -> bool {
        self.kind().is_file_class()
    }

    /// Operations that read or write file metadata.
    pub fn is_metadata_class(&self) -> bool {
        self.kind().is_metadata_class()
    }
}

/// The operation type with the transmit/receive information stripped away
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum MsgKind {
    #[default]
    Undefined,
    Version,
    Auth,
    Attach,
    Error,
    Flush,
    Walk,
    Open,
    Create,
    Read,
    Write,
    Clunk,
    Remove,
    Stat,
    WStat,
}

impl MsgKind {
    /// The request-direction wire form of this operation.
    pub fn t_form(&self) -> MsgType {
        use crate::MsgKind::*;

        match *self {
            Version => MsgType::TVersion,
            Auth => MsgType::TAuth,
            Attach => MsgType::TAttach,
            Error => MsgType::TError,
            Flush => MsgType::TFlush,
            Walk => MsgType::TWalk,
            Open => MsgType::TOpen,
            Create => MsgType::TCreate,
            Read => MsgType::TRead,
            Write => MsgType::TWrite,
            Clunk => MsgType::TClunk,
            Remove => MsgType::TRemove,
            Stat => MsgType::TStat,
            WStat => MsgType::TWStat,
            Undefined => MsgType::TBad,
        }
    }

    /// The response-direction wire form of this operation.
    pub fn r_form(&self) -> MsgType {
        use crate::MsgKind::*;

        match *self {
            Version => MsgType::RVersion,
            Auth => MsgType::RAuth,
            Attach => MsgType::RAttach,
            Error => MsgType::RError,
            Flush => MsgType::RFlush,
            Walk => MsgType::RWalk,
            Open => MsgType::ROpen,
            Create => MsgType::RCreate,
            Read => MsgType::RRead,
            Write => MsgType::RWrite,
            Clunk => MsgType::RClunk,
            Remove => MsgType::RRemove,
            Stat => MsgType::RStat,
            WStat => MsgType::RWStat,
            Undefined => MsgType::RBad,
        }
    }

    pub fn is_session_class(&self) -> bool {
        use crate::MsgKind::*;
        matches!(*self, Version | Auth | Attach | Flush | Error)
    }

    pub fn is_file_class(&self) -> bool {
        use crate::MsgKind::*;
        matches!(*self, Walk | Open | Create | Read | Write | Clunk)
    }

    pub fn is_metadata_class(&self) -> bool {
        matches!(*self, MsgKind::Stat | MsgKind::WStat)
    }
}

/// Request bodies, one arm per operation
///
/// `Undefined` is the default-constructed placeholder; encoding it is an
/// error, and decoding never produces it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TCall {
    Version {
        msize: u32,
        version: String,
    },
    Auth {
        afid: u32,
        uname: String,
        aname: String,
    },
    Attach {
        fid: u32,
        afid: u32,
        uname: String,
        aname: String,
    },
    /// Never legitimately sent; carried for regularity so a peer that
    /// emits one can still be answered.
    Error,
    Flush {
        oldtag: u16,
    },
    Walk {
        fid: u32,
        newfid: u32,
        wname: Vec<String>,
    },
    Open {
        fid: u32,
        mode: u8,
    },
    Create {
        fid: u32,
        name: String,
        perm: u32,
        mode: u8,
    },
    Read {
        fid: u32,
        offset: u64,
        count: u32,
    },
    Write {
        fid: u32,
        offset: u64,
        data: Data,
    },
    Clunk {
        fid: u32,
    },
    Remove {
        fid: u32,
    },
    Stat {
        fid: u32,
    },
    WStat {
        fid: u32,
        stat: Stat,
    },
    #[default]
    Undefined,
}

impl TCall {
    pub fn kind(&self) -> MsgKind {
        match *self {
            TCall::Version { .. } => MsgKind::Version,
            TCall::Auth { .. } => MsgKind::Auth,
            TCall::Attach { .. } => MsgKind::Attach,
            TCall::Error => MsgKind::Error,
            TCall::Flush { .. } => MsgKind::Flush,
            TCall::Walk { .. } => MsgKind::Walk,
            TCall::Open { .. } => MsgKind::Open,
            TCall::Create { .. } => MsgKind::Create,
            TCall::Read { .. } => MsgKind::Read,
            TCall::Write { .. } => MsgKind::Write,
            TCall::Clunk { .. } => MsgKind::Clunk,
            TCall::Remove { .. } => MsgKind::Remove,
            TCall::Stat { .. } => MsgKind::Stat,
            TCall::WStat { .. } => MsgKind::WStat,
            TCall::Undefined => MsgKind::Undefined,
        }
    }

    /// The wire opcode this body travels under.
    pub fn op(&self) -> MsgType {
        self.kind().t_form()
    }

    /// Get the fids which self contains
    pub fn fids(&self) -> Vec<u32> {
        match *self {
            TCall::Attach { afid, .. } if afid != NOFID => vec![afid],
            TCall::Walk { fid, .. } => vec![fid],
            TCall::Open { fid, .. } => vec![fid],
            TCall::Create { fid, .. } => vec![fid],
            TCall::Read { fid, .. } => vec![fid],
            TCall::Write { fid, .. } => vec![fid],
            TCall::Clunk { fid } => vec![fid],
            TCall::Remove { fid } => vec![fid],
            TCall::Stat { fid } => vec![fid],
            TCall::WStat { fid, .. } => vec![fid],
            _ => Vec::new(),
        }
    }

    /// Get the newfid which self contains
    pub fn newfid(&self) -> Option<u32> {
        match *self {
            TCall::Auth { afid, .. } => Some(afid),
            TCall::Attach { fid, .. } => Some(fid),
            TCall::Walk { newfid, .. } => Some(newfid),
            _ => None,
        }
    }
}

/// Response bodies, one arm per operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RCall {
    Version {
        msize: u32,
        version: String,
    },
    Auth {
        aqid: QId,
    },
    Attach {
        qid: QId,
    },
    Error {
        ename: String,
    },
    Flush,
    Walk {
        wqid: Vec<QId>,
    },
    Open {
        qid: QId,
        iounit: u32,
    },
    Create {
        qid: QId,
        iounit: u32,
    },
    Read {
        data: Data,
    },
    Write {
        count: u32,
    },
    Clunk,
    Remove,
    Stat {
        stat: Stat,
    },
    WStat,
    #[default]
    Undefined,
}

impl RCall {
    pub fn kind(&self) -> MsgKind {
        match *self {
            RCall::Version { .. } => MsgKind::Version,
            RCall::Auth { .. } => MsgKind::Auth,
            RCall::Attach { .. } => MsgKind::Attach,
            RCall::Error { .. } => MsgKind::Error,
            RCall::Flush => MsgKind::Flush,
            RCall::Walk { .. } => MsgKind::Walk,
            RCall::Open { .. } => MsgKind::Open,
            RCall::Create { .. } => MsgKind::Create,
            RCall::Read { .. } => MsgKind::Read,
            RCall::Write { .. } => MsgKind::Write,
            RCall::Clunk => MsgKind::Clunk,
            RCall::Remove => MsgKind::Remove,
            RCall::Stat { .. } => MsgKind::Stat,
            RCall::WStat => MsgKind::WStat,
            RCall::Undefined => MsgKind::Undefined,
        }
    }

    /// The wire opcode this body travels under.
    pub fn op(&self) -> MsgType {
        self.kind().r_form()
    }

    /// Get the qids which self contains
    pub fn qids(&self) -> Vec<QId> {
        match *self {
            RCall::Auth { aqid } => vec![aqid],
            RCall::Attach { qid } => vec![qid],
            RCall::Walk { ref wqid } => wqid.clone(),
            RCall::Open { qid, .. } => vec![qid],
            RCall::Create { qid, .. } => vec![qid],
            _ => Vec::new(),
        }
    }
}

/// Envelope for a request
///
/// The tag is chosen by the requester and echoed by the responder.
/// Version requests are untagged: the constructor pins `NOTAG` and the
/// encoder writes `NOTAG` for a Version body no matter what the field
/// holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    pub tag: u16,
    pub body: TCall,
}

impl Request {
    pub fn new(tag: u16, body: TCall) -> Request {
        let tag = match body {
            TCall::Version { .. } => NOTAG,
            _ => tag,
        };
        Request { tag, body }
    }

    /// Shorthand for the untagged version request opening a session.
    pub fn version(msize: u32, version: impl Into<String>) -> Request {
        Request {
            tag: NOTAG,
            body: TCall::Version {
                msize,
                version: version.into(),
            },
        }
    }

    pub fn op(&self) -> MsgType {
        self.body.op()
    }

    pub fn kind(&self) -> MsgKind {
        self.body.kind()
    }
}

/// Envelope for a response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub tag: u16,
    pub body: RCall,
}

impl Response {
    pub fn new(tag: u16, body: RCall) -> Response {
        let tag = match body {
            RCall::Version { .. } => NOTAG,
            _ => tag,
        };
        Response { tag, body }
    }

    /// Build the error reply every failed operation answers with.
    pub fn error(tag: u16, ename: impl Into<String>) -> Response {
        Response {
            tag,
            body: RCall::Error {
                ename: ename.into(),
            },
        }
    }

    pub fn op(&self) -> MsgType {
        self.body.op()
    }

    pub fn kind(&self) -> MsgKind {
        self.body.kind()
    }
}

/// Either direction of traffic, for peers that accept or emit both
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Request(Request),
    Response(Response),
}

impl Interaction {
    pub fn tag(&self) -> u16 {
        match *self {
            Interaction::Request(ref req) => req.tag,
            Interaction::Response(ref resp) => resp.tag,
        }
    }

    pub fn kind(&self) -> MsgKind {
        match *self {
            Interaction::Request(ref req) => req.kind(),
            Interaction::Response(ref resp) => resp.kind(),
        }
    }
}

/// Negotiate the reply to a client's version request.
///
/// The returned msize never exceeds the client's offer, and the returned
/// version is the largest protocol string this crate supports that
/// prefixes the client's, or [`VERSION_UNKNOWN`] when none does. A client
/// that receives `"unknown"` must retry version negotiation before any
/// other traffic.
pub fn negotiate(client_msize: u32, client_version: &str) -> (u32, String) {
    let msize = client_msize.min(DEFAULT_MSIZE);
    let version = if client_version.starts_with(P92000) {
        P92000
    } else if client_version.starts_with(P9) {
        P9
    } else {
        VERSION_UNKNOWN
    };
    (msize, version.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MsgKind; 14] = [
        MsgKind::Version,
        MsgKind::Auth,
        MsgKind::Attach,
        MsgKind::Error,
        MsgKind::Flush,
        MsgKind::Walk,
        MsgKind::Open,
        MsgKind::Create,
        MsgKind::Read,
        MsgKind::Write,
        MsgKind::Clunk,
        MsgKind::Remove,
        MsgKind::Stat,
        MsgKind::WStat,
    ];

    #[test]
    fn opcode_parity() {
        for kind in KINDS {
            let t = kind.t_form();
            let r = kind.r_form();
            assert_eq!((t as u8) & 1, 0, "{t:?} must be even");
            assert_eq!(r as u8, t as u8 + 1, "{r:?} must follow {t:?}");
            assert!(t.is_t());
            assert!(r.is_r());
            assert_eq!(t.kind(), kind);
            assert_eq!(r.kind(), kind);
        }
    }

    #[test]
    fn canonical_assignments() {
        assert_eq!(MsgType::TVersion as u8, 100);
        assert_eq!(MsgType::TAuth as u8, 102);
        assert_eq!(MsgType::TAttach as u8, 104);
        assert_eq!(MsgType::TError as u8, 106);
        assert_eq!(MsgType::TFlush as u8, 108);
        assert_eq!(MsgType::TWalk as u8, 110);
        assert_eq!(MsgType::TOpen as u8, 112);
        assert_eq!(MsgType::TCreate as u8, 114);
        assert_eq!(MsgType::TRead as u8, 116);
        assert_eq!(MsgType::TWrite as u8, 118);
        assert_eq!(MsgType::TClunk as u8, 120);
        assert_eq!(MsgType::TRemove as u8, 122);
        assert_eq!(MsgType::TStat as u8, 124);
        assert_eq!(MsgType::TWStat as u8, 126);
        assert_eq!(MsgType::TBad as u8, 0xfe);
        assert_eq!(MsgType::RBad as u8, 0xff);
    }

    #[test]
    fn sentinels_map_to_undefined() {
        assert_eq!(MsgType::TBad.kind(), MsgKind::Undefined);
        assert_eq!(MsgType::RBad.kind(), MsgKind::Undefined);
        assert_eq!(MsgKind::Undefined.t_form(), MsgType::TBad);
        assert_eq!(MsgKind::Undefined.r_form(), MsgType::RBad);
        assert!(MsgType::TBad.is_t());
        assert!(MsgType::RBad.is_r());
    }

    #[test]
    fn expected_response_pairs() {
        assert_eq!(MsgType::TVersion.expected_response(), MsgType::RVersion);
        assert_eq!(MsgType::TClunk.expected_response(), MsgType::RClunk);
        assert_eq!(MsgType::RWalk.expected_response(), MsgType::RError);
        assert_eq!(MsgType::TBad.expected_response(), MsgType::RBad);
        assert_eq!(MsgType::RBad.expected_response(), MsgType::RBad);
    }

    #[test]
    fn operation_classes() {
        assert!(MsgKind::Version.is_session_class());
        assert!(MsgKind::Flush.is_session_class());
        assert!(MsgKind::Error.is_session_class());
        assert!(MsgKind::Walk.is_file_class());
        assert!(MsgKind::Clunk.is_file_class());
        assert!(MsgKind::Stat.is_metadata_class());
        assert!(MsgKind::WStat.is_metadata_class());
        assert!(!MsgKind::Stat.is_file_class());
        assert!(!MsgKind::Walk.is_session_class());
        assert!(MsgType::TOpen.is_file_class());
    }

    #[test]
    fn version_requests_are_pinned_to_notag() {
        let req = Request::new(
            7,
            TCall::Version {
                msize: 8192,
                version: P92000.to_owned(),
            },
        );
        assert_eq!(req.tag, NOTAG);

        let resp = Response::new(
            7,
            RCall::Version {
                msize: 8192,
                version: P92000.to_owned(),
            },
        );
        assert_eq!(resp.tag, NOTAG);

        let clunk = Request::new(7, TCall::Clunk { fid: 1 });
        assert_eq!(clunk.tag, 7);
    }

    #[test]
    fn stat_size_counts_strings() {
        let stat = Stat {
            name: "file".to_owned(),
            uid: "glenda".to_owned(),
            ..Stat::default()
        };
        // 39 fixed bytes + four u16 prefixes + string payloads
        assert_eq!(stat.size(), 39 + 8 + 4 + 6);
    }

    #[test]
    fn negotiation() {
        assert_eq!(negotiate(8192, "9P2000"), (8192, "9P2000".to_owned()));
        assert_eq!(
            negotiate(u32::MAX, "9P2000.L"),
            (DEFAULT_MSIZE, "9P2000".to_owned())
        );
        assert_eq!(negotiate(512, "9P1776"), (512, "9P".to_owned()));
        assert_eq!(negotiate(512, "styx"), (512, "unknown".to_owned()));
    }

    #[test]
    fn fid_introspection() {
        let walk = TCall::Walk {
            fid: 3,
            newfid: 4,
            wname: vec!["usr".to_owned()],
        };
        assert_eq!(walk.fids(), vec![3]);
        assert_eq!(walk.newfid(), Some(4));

        let attach = TCall::Attach {
            fid: 1,
            afid: NOFID,
            uname: "glenda".to_owned(),
            aname: String::new(),
        };
        assert!(attach.fids().is_empty());
        assert_eq!(attach.newfid(), Some(1));

        let qid = QId {
            typ: QIdType::DIR,
            version: 0,
            path: 11,
        };
        assert_eq!(RCall::Attach { qid }.qids(), vec![qid]);
        assert!(RCall::Clunk.qids().is_empty());
    }

    #[test]
    fn default_bodies_are_undefined() {
        assert_eq!(TCall::default(), TCall::Undefined);
        assert_eq!(RCall::default(), RCall::Undefined);
        assert_eq!(Request::default().kind(), MsgKind::Undefined);
    }
}
