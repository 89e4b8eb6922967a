//! Serialize/deserialize 9P messages into/from binary.

use std::ops::{Shl, Shr};

use num_traits::FromPrimitive;

use crate::error::{DecodeError, EncodeError};
use crate::fcall::*;
use crate::stream::MessageStream;

macro_rules! decode {
    ($stream:expr) => {
        Decodable::decode($stream)?
    };

    ($typ:ident, $stream:expr) => {
        $typ::from_bits_truncate(decode!($stream))
    };
}

/// A serializing specific result to overload operators on `Result`
///
/// # Overloaded operators
/// <<, >>, ?
pub struct SResult<T, E>(pub Result<T, E>);

/// A wrapper of [`MessageStream`] providing operator overloads for
/// serializing
///
/// Operator '<<' serializes the right hand side argument into
/// the left hand side encoder
#[derive(Debug)]
pub struct Encoder<'a> {
    stream: &'a mut MessageStream,
    bytes: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(stream: &'a mut MessageStream) -> Encoder<'a> {
        Encoder { stream, bytes: 0 }
    }

    /// Return total bytes written
    pub fn bytes_written(&self) -> usize {
        self.bytes
    }

    /// Encode data, equivalent to: encoder << data
    pub fn encode<T: Encodable>(&mut self, data: &T) -> Result<usize, EncodeError> {
        let bytes = data.encode(self.stream)?;
        self.bytes += bytes;
        Ok(bytes)
    }
}

impl<'a, 's, T: Encodable> Shl<&'a T> for Encoder<'s> {
    type Output = SResult<Encoder<'s>, EncodeError>;
    fn shl(mut self, rhs: &'a T) -> Self::Output {
        match self.encode(rhs) {
            Ok(_) => SResult(Ok(self)),
            Err(e) => SResult(Err(e)),
        }
    }
}

impl<'a, 's, T: Encodable> Shl<&'a T> for SResult<Encoder<'s>, EncodeError> {
    type Output = Self;
    fn shl(self, rhs: &'a T) -> Self::Output {
        match self.0 {
            Ok(mut encoder) => match encoder.encode(rhs) {
                Ok(_) => SResult(Ok(encoder)),
                Err(e) => SResult(Err(e)),
            },
            Err(e) => SResult(Err(e)),
        }
    }
}

/// A wrapper of [`MessageStream`] providing operator overloads for
/// deserializing
#[derive(Debug)]
pub struct Decoder<'a> {
    stream: &'a mut MessageStream,
}

impl<'a> Decoder<'a> {
    pub fn new(stream: &'a mut MessageStream) -> Decoder<'a> {
        Decoder { stream }
    }

    pub fn decode<T: Decodable>(&mut self) -> Result<T, DecodeError> {
        Decodable::decode(self.stream)
    }
}

impl<'a, 's, T: Decodable> Shr<&'a mut T> for Decoder<'s> {
    type Output = SResult<Decoder<'s>, DecodeError>;
    fn shr(mut self, rhs: &'a mut T) -> Self::Output {
        match self.decode() {
            Ok(r) => {
                *rhs = r;
                SResult(Ok(self))
            }
            Err(e) => SResult(Err(e)),
        }
    }
}

impl<'a, 's, T: Decodable> Shr<&'a mut T> for SResult<Decoder<'s>, DecodeError> {
    type Output = Self;
    fn shr(self, rhs: &'a mut T) -> Self::Output {
        match self.0 {
            Ok(mut decoder) => match decoder.decode() {
                Ok(r) => {
                    *rhs = r;
                    SResult(Ok(decoder))
                }
                Err(e) => SResult(Err(e)),
            },
            Err(e) => SResult(Err(e)),
        }
    }
}

/// Trait representing a type which can be serialized into binary
pub trait Encodable {
    /// Encode self to s and returns the number of bytes encoded
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError>;
}

impl Encodable for u8 {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        s.put_u8(*self);
        Ok(1)
    }
}

impl Encodable for u16 {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        s.put_u16(*self);
        Ok(2)
    }
}

impl Encodable for u32 {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        s.put_u32(*self);
        Ok(4)
    }
}

impl Encodable for u64 {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        s.put_u64(*self);
        Ok(8)
    }
}

impl Encodable for String {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        let len = u16::try_from(self.len()).map_err(|_| EncodeError::LengthOverflow(self.len()))?;
        s.put_u16(len);
        s.write_bytes(self.as_bytes());
        Ok(2 + self.len())
    }
}

impl Encodable for MsgType {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        s.put_u8(*self as u8);
        Ok(1)
    }
}

impl Encodable for QId {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        match Encoder::new(s) << &self.typ.bits() << &self.version << &self.path {
            SResult(Ok(enc)) => Ok(enc.bytes_written()),
            SResult(Err(e)) => Err(e),
        }
    }
}

impl Encodable for Stat {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        match Encoder::new(s)
            << &self.size()
            << &self.typ
            << &self.dev
            << &self.qid
            << &self.mode
            << &self.atime
            << &self.mtime
            << &self.length
            << &self.name
            << &self.uid
            << &self.gid
            << &self.muid
        {
            SResult(Ok(enc)) => Ok(enc.bytes_written()),
            SResult(Err(e)) => Err(e),
        }
    }
}

impl Encodable for Data {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        let size = self.0.len();
        let count = u32::try_from(size).map_err(|_| EncodeError::LengthOverflow(size))?;
        s.put_u32(count);
        s.write_bytes(&self.0);
        Ok(4 + size)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        let len = u16::try_from(self.len()).map_err(|_| EncodeError::LengthOverflow(self.len()))?;
        match self.iter().fold(Encoder::new(s) << &len, |acc, e| acc << e) {
            SResult(Ok(enc)) => Ok(enc.bytes_written()),
            SResult(Err(e)) => Err(e),
        }
    }
}

/// An encoded stat wrapped in its own u16 byte count, as carried by RStat.
///
/// The wrapper length is distinct from the stat's leading self-size; both
/// travel on the wire.
struct SizedStat<'a>(&'a Stat);

impl Encodable for SizedStat<'_> {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        let mut inner = MessageStream::new();
        let n = self.0.encode(&mut inner)?;
        let len = u16::try_from(n).map_err(|_| EncodeError::LengthOverflow(n))?;
        s.put_u16(len);
        s.write_bytes(inner.as_bytes());
        Ok(2 + n)
    }
}

impl Encodable for Request {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        use crate::fcall::TCall::*;

        if let Walk {
            fid,
            newfid,
            ref wname,
        } = self.body
        {
            if wname.len() > MAXWELEM {
                return Err(EncodeError::TooManyNames(wname.len()));
            }
            if wname.is_empty() && newfid == fid {
                return Err(EncodeError::CloneSameFid(fid));
            }
        }

        let tag = match self.body {
            Version { .. } => NOTAG,
            Undefined => return Err(EncodeError::UndefinedVariant),
            _ => self.tag,
        };
        let buf = Encoder::new(s) << &self.body.op() << &tag;

        let buf = match self.body {
            Version {
                ref msize,
                ref version,
            } => buf << msize << version,
            Auth {
                ref afid,
                ref uname,
                ref aname,
            } => buf << afid << uname << aname,
            Attach {
                ref fid,
                ref afid,
                ref uname,
                ref aname,
            } => buf << fid << afid << uname << aname,
            Error => buf,
            Flush { ref oldtag } => buf << oldtag,
            Walk {
                ref fid,
                ref newfid,
                ref wname,
            } => buf << fid << newfid << wname,
            Open { ref fid, ref mode } => buf << fid << mode,
            Create {
                ref fid,
                ref name,
                ref perm,
                ref mode,
            } => buf << fid << name << perm << mode,
            Read {
                ref fid,
                ref offset,
                ref count,
            } => buf << fid << offset << count,
            Write {
                ref fid,
                ref offset,
                ref data,
            } => buf << fid << offset << data,
            Clunk { ref fid } => buf << fid,
            Remove { ref fid } => buf << fid,
            Stat { ref fid } => buf << fid,
            WStat { ref fid, ref stat } => buf << fid << stat,
            Undefined => return Err(EncodeError::UndefinedVariant),
        };

        match buf {
            SResult(Ok(b)) => Ok(b.bytes_written()),
            SResult(Err(e)) => Err(e),
        }
    }
}

impl Encodable for Response {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        use crate::fcall::RCall::*;

        let tag = match self.body {
            Version { .. } => NOTAG,
            Undefined => return Err(EncodeError::UndefinedVariant),
            _ => self.tag,
        };
        let buf = Encoder::new(s) << &self.body.op() << &tag;

        let buf = match self.body {
            Version {
                ref msize,
                ref version,
            } => buf << msize << version,
            Auth { ref aqid } => buf << aqid,
            Attach { ref qid } => buf << qid,
            Error { ref ename } => buf << ename,
            Flush => buf,
            Walk { ref wqid } => buf << wqid,
            Open {
                ref qid,
                ref iounit,
            } => buf << qid << iounit,
            Create {
                ref qid,
                ref iounit,
            } => buf << qid << iounit,
            Read { ref data } => buf << data,
            Write { ref count } => buf << count,
            Clunk => buf,
            Remove => buf,
            Stat { ref stat } => buf << &SizedStat(stat),
            WStat => buf,
            Undefined => return Err(EncodeError::UndefinedVariant),
        };

        match buf {
            SResult(Ok(b)) => Ok(b.bytes_written()),
            SResult(Err(e)) => Err(e),
        }
    }
}

impl Encodable for Interaction {
    fn encode(&self, s: &mut MessageStream) -> Result<usize, EncodeError> {
        match *self {
            Interaction::Request(ref req) => req.encode(s),
            Interaction::Response(ref resp) => resp.encode(s),
        }
    }
}

/// Trait representing a type which can be deserialized from binary
pub trait Decodable: Sized {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError>;
}

impl Decodable for u8 {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        s.get_u8()
    }
}

impl Decodable for u16 {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        s.get_u16()
    }
}

impl Decodable for u32 {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        s.get_u32()
    }
}

impl Decodable for u64 {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        s.get_u64()
    }
}

impl Decodable for String {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let len: u16 = decode!(s);
        let bytes = s.read_exact(len as usize)?.to_vec();
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidString)
    }
}

impl Decodable for QId {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        Ok(QId {
            typ: decode!(QIdType, s),
            version: decode!(s),
            path: decode!(s),
        })
    }
}

impl Decodable for Stat {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        // The declared self-size is read but not enforced; peers disagree
        // about padding and the fields are positional anyway.
        let _size: u16 = decode!(s);
        Ok(Stat {
            typ: decode!(s),
            dev: decode!(s),
            qid: decode!(s),
            mode: decode!(s),
            atime: decode!(s),
            mtime: decode!(s),
            length: decode!(s),
            name: decode!(s),
            uid: decode!(s),
            gid: decode!(s),
            muid: decode!(s),
        })
    }
}

impl Decodable for Data {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let len: u32 = decode!(s);
        Ok(Data(s.read_exact(len as usize)?.to_vec()))
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let len: u16 = decode!(s);
        let mut buf = Vec::new();
        for _ in 0..len {
            buf.push(decode!(s));
        }
        Ok(buf)
    }
}

impl Decodable for MsgType {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let op = s.get_u8()?;
        MsgType::from_u8(op).ok_or(DecodeError::UnknownOpcode(op))
    }
}

/// Classify the peeked opcode without consuming it.
fn peek_type(s: &MessageStream) -> Result<MsgType, DecodeError> {
    let op = s.peek().ok_or(DecodeError::ShortRead)?;
    let typ = MsgType::from_u8(op).ok_or(DecodeError::UnknownOpcode(op))?;
    if typ.kind() == MsgKind::Undefined {
        return Err(DecodeError::UnknownOpcode(op));
    }
    Ok(typ)
}

impl Decodable for Request {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let typ = peek_type(s)?;
        if typ.is_r() {
            return Err(DecodeError::WrongDirection(typ as u8));
        }

        // The concrete decoder consumes the opcode it was dispatched on.
        let op: MsgType = decode!(s);
        let tag: u16 = decode!(s);
        let body = match op.kind() {
            MsgKind::Version => TCall::Version {
                msize: decode!(s),
                version: decode!(s),
            },
            MsgKind::Auth => TCall::Auth {
                afid: decode!(s),
                uname: decode!(s),
                aname: decode!(s),
            },
            MsgKind::Attach => TCall::Attach {
                fid: decode!(s),
                afid: decode!(s),
                uname: decode!(s),
                aname: decode!(s),
            },
            MsgKind::Error => TCall::Error,
            MsgKind::Flush => TCall::Flush { oldtag: decode!(s) },
            MsgKind::Walk => TCall::Walk {
                fid: decode!(s),
                newfid: decode!(s),
                wname: decode!(s),
            },
            MsgKind::Open => TCall::Open {
                fid: decode!(s),
                mode: decode!(s),
            },
            MsgKind::Create => TCall::Create {
                fid: decode!(s),
                name: decode!(s),
                perm: decode!(s),
                mode: decode!(s),
            },
            MsgKind::Read => TCall::Read {
                fid: decode!(s),
                offset: decode!(s),
                count: decode!(s),
            },
            MsgKind::Write => TCall::Write {
                fid: decode!(s),
                offset: decode!(s),
                data: decode!(s),
            },
            MsgKind::Clunk => TCall::Clunk { fid: decode!(s) },
            MsgKind::Remove => TCall::Remove { fid: decode!(s) },
            MsgKind::Stat => TCall::Stat { fid: decode!(s) },
            MsgKind::WStat => TCall::WStat {
                fid: decode!(s),
                stat: decode!(s),
            },
            MsgKind::Undefined => return Err(DecodeError::UnknownOpcode(op as u8)),
        };

        Ok(Request { tag, body })
    }
}

impl Decodable for Response {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let typ = peek_type(s)?;
        if typ.is_t() {
            return Err(DecodeError::WrongDirection(typ as u8));
        }

        let op: MsgType = decode!(s);
        let tag: u16 = decode!(s);
        let body = match op.kind() {
            MsgKind::Version => RCall::Version {
                msize: decode!(s),
                version: decode!(s),
            },
            MsgKind::Auth => RCall::Auth { aqid: decode!(s) },
            MsgKind::Attach => RCall::Attach { qid: decode!(s) },
            MsgKind::Error => RCall::Error { ename: decode!(s) },
            MsgKind::Flush => RCall::Flush,
            MsgKind::Walk => RCall::Walk { wqid: decode!(s) },
            MsgKind::Open => RCall::Open {
                qid: decode!(s),
                iounit: decode!(s),
            },
            MsgKind::Create => RCall::Create {
                qid: decode!(s),
                iounit: decode!(s),
            },
            MsgKind::Read => RCall::Read { data: decode!(s) },
            MsgKind::Write => RCall::Write { count: decode!(s) },
            MsgKind::Clunk => RCall::Clunk,
            MsgKind::Remove => RCall::Remove,
            MsgKind::Stat => {
                // The outer u16 wrapper frames the encoded stat; it must be
                // consumed exactly.
                let wrapped: u16 = decode!(s);
                let bytes = s.read_exact(wrapped as usize)?.to_vec();
                let mut inner = MessageStream::new();
                inner.load_bytes(bytes);
                let stat: Stat = Decodable::decode(&mut inner)?;
                if inner.remaining() != 0 {
                    return Err(DecodeError::SizeMismatch);
                }
                RCall::Stat { stat }
            }
            MsgKind::WStat => RCall::WStat,
            MsgKind::Undefined => return Err(DecodeError::UnknownOpcode(op as u8)),
        };

        Ok(Response { tag, body })
    }
}

impl Decodable for Interaction {
    fn decode(s: &mut MessageStream) -> Result<Self, DecodeError> {
        let typ = peek_type(s)?;
        if typ.is_t() {
            Ok(Interaction::Request(decode!(s)))
        } else {
            Ok(Interaction::Response(decode!(s)))
        }
    }
}

#[cfg(test)]
fn encode_to_vec<T: Encodable>(msg: &T) -> Vec<u8> {
    let mut s = MessageStream::new();
    msg.encode(&mut s).unwrap();
    s.take_bytes()
}

#[cfg(test)]
fn decode_from<T: Decodable>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut s = MessageStream::new();
    s.load_bytes(bytes.to_vec());
    T::decode(&mut s)
}

#[test]
fn encoder_chain_writes_in_order() {
    let mut s = MessageStream::new();
    let enc = Encoder::new(&mut s) << &1u8 << &2u16 << &3u32;
    match enc {
        SResult(Ok(enc)) => assert_eq!(enc.bytes_written(), 7),
        SResult(Err(e)) => panic!("{e}"),
    }
    assert_eq!(s.as_bytes(), [1, 2, 0, 3, 0, 0, 0]);
}

#[test]
fn decoder_chain_reads_in_order() {
    let mut s = MessageStream::new();
    s.put_u8(9);
    s.put_u16(0x0807);
    let (mut a, mut b) = (0u8, 0u16);
    match Decoder::new(&mut s) >> &mut a >> &mut b {
        SResult(Ok(_)) => {}
        SResult(Err(e)) => panic!("{e}"),
    }
    assert_eq!((a, b), (9, 0x0807));
}

#[test]
fn version_request_bytes() {
    let req = Request::version(8192, P92000);
    assert_eq!(
        encode_to_vec(&req),
        [
            0x64, 0xff, 0xff, 0x00, 0x20, 0x00, 0x00, 0x06, 0x00, 0x39, 0x50, 0x32, 0x30, 0x30,
            0x30,
        ]
    );
}

#[test]
fn clunk_request_bytes() {
    let req = Request::new(0x0007, TCall::Clunk { fid: 0x42 });
    assert_eq!(encode_to_vec(&req), [0x78, 0x07, 0x00, 0x42, 0x00, 0x00, 0x00]);
}

#[test]
fn error_response_bytes() {
    let resp = Response::error(0x0003, "perm");
    assert_eq!(
        encode_to_vec(&resp),
        [0x6b, 0x03, 0x00, 0x04, 0x00, 0x70, 0x65, 0x72, 0x6d]
    );
}

#[test]
fn empty_read_response_bytes() {
    let resp = Response::new(1, RCall::Read { data: Data(vec![]) });
    assert_eq!(
        encode_to_vec(&resp),
        [0x75, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn walk_response_bytes() {
    let resp = Response::new(
        2,
        RCall::Walk {
            wqid: vec![QId {
                typ: QIdType::DIR,
                version: 1,
                path: 0x1234,
            }],
        },
    );
    assert_eq!(
        encode_to_vec(&resp),
        [
            0x6f, 0x02, 0x00, 0x01, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x34, 0x12, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn unknown_opcode_is_rejected() {
    let err = decode_from::<Request>(&[0x42, 0x00, 0x00]).unwrap_err();
    assert_eq!(err, DecodeError::UnknownOpcode(0x42));

    // The sentinels are not concrete wire operations either.
    let err = decode_from::<Request>(&[0xfe, 0x00, 0x00]).unwrap_err();
    assert_eq!(err, DecodeError::UnknownOpcode(0xfe));
    let err = decode_from::<Interaction>(&[0xff, 0x00, 0x00]).unwrap_err();
    assert_eq!(err, DecodeError::UnknownOpcode(0xff));
}

#[test]
fn direction_is_checked() {
    let resp = Response::new(1, RCall::Clunk);
    let bytes = encode_to_vec(&resp);
    let err = decode_from::<Request>(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::WrongDirection(MsgType::RClunk as u8));

    let req = Request::new(1, TCall::Clunk { fid: 0 });
    let bytes = encode_to_vec(&req);
    let err = decode_from::<Response>(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::WrongDirection(MsgType::TClunk as u8));
}

#[test]
fn empty_stream_is_a_short_read() {
    assert_eq!(
        decode_from::<Request>(&[]).unwrap_err(),
        DecodeError::ShortRead
    );
}

#[test]
fn undefined_messages_do_not_encode() {
    let mut s = MessageStream::new();
    assert_eq!(
        Request::default().encode(&mut s).unwrap_err(),
        EncodeError::UndefinedVariant
    );
    assert_eq!(
        Response::default().encode(&mut s).unwrap_err(),
        EncodeError::UndefinedVariant
    );
}

#[test]
fn oversize_string_overflows() {
    let req = Request::new(
        1,
        TCall::Create {
            fid: 1,
            name: "x".repeat(70_000),
            perm: 0,
            mode: om::READ,
        },
    );
    let mut s = MessageStream::new();
    assert_eq!(
        req.encode(&mut s).unwrap_err(),
        EncodeError::LengthOverflow(70_000)
    );
}

#[test]
fn walk_validation_is_encode_only() {
    let too_many = Request::new(
        1,
        TCall::Walk {
            fid: 1,
            newfid: 2,
            wname: vec!["a".to_owned(); MAXWELEM + 1],
        },
    );
    let mut s = MessageStream::new();
    assert_eq!(
        too_many.encode(&mut s).unwrap_err(),
        EncodeError::TooManyNames(MAXWELEM + 1)
    );

    let bad_clone = Request::new(
        1,
        TCall::Walk {
            fid: 3,
            newfid: 3,
            wname: vec![],
        },
    );
    let mut s = MessageStream::new();
    assert_eq!(
        bad_clone.encode(&mut s).unwrap_err(),
        EncodeError::CloneSameFid(3)
    );

    // The decoder tolerates both shapes: TWalk, tag 1, fid 3, newfid 3,
    // zero names.
    let bytes = [0x6e, 0x01, 0x00, 3, 0, 0, 0, 3, 0, 0, 0, 0, 0];
    let req: Request = decode_from(&bytes).unwrap();
    assert_eq!(
        req.body,
        TCall::Walk {
            fid: 3,
            newfid: 3,
            wname: vec![],
        }
    );
}

#[test]
fn fid_clone_with_fresh_fid_encodes() {
    let req = Request::new(
        1,
        TCall::Walk {
            fid: 3,
            newfid: 4,
            wname: vec![],
        },
    );
    let decoded: Request = decode_from(&encode_to_vec(&req)).unwrap();
    assert_eq!(req, decoded);
}

#[test]
fn stat_double_framing() {
    let stat = Stat {
        typ: 0x01,
        dev: 0x02,
        qid: QId {
            typ: QIdType::FILE,
            version: 3,
            path: 4,
        },
        mode: dm::READ | dm::WRITE,
        atime: 5,
        mtime: 6,
        length: 7,
        name: "README".to_owned(),
        uid: "glenda".to_owned(),
        gid: "sys".to_owned(),
        muid: "glenda".to_owned(),
    };
    let resp = Response::new(9, RCall::Stat { stat: stat.clone() });
    let bytes = encode_to_vec(&resp);

    // op + tag, then the wrapper length, then the stat's own size.
    let wrapper = u16::from_le_bytes([bytes[3], bytes[4]]);
    let inner = u16::from_le_bytes([bytes[5], bytes[6]]);
    assert_eq!(wrapper as usize, bytes.len() - 5);
    assert_eq!(inner, stat.size());
    assert_eq!(inner, wrapper - 2);

    let decoded: Response = decode_from(&bytes).unwrap();
    assert_eq!(decoded.body, RCall::Stat { stat });
}

#[test]
fn stat_wrapper_must_be_consumed_exactly() {
    let stat = Stat::default();
    let mut s = MessageStream::new();
    let resp = Response::new(9, RCall::Stat { stat });
    resp.encode(&mut s).unwrap();
    let mut bytes = s.take_bytes();

    // Grow the wrapper by one byte: the inner decode leaves it behind.
    bytes.push(0);
    let wrapper = u16::from_le_bytes([bytes[3], bytes[4]]) + 1;
    bytes[3..5].copy_from_slice(&wrapper.to_le_bytes());
    assert_eq!(
        decode_from::<Response>(&bytes).unwrap_err(),
        DecodeError::SizeMismatch
    );
}

#[test]
fn wstat_carries_the_stat_inline() {
    let stat = Stat {
        name: "notes".to_owned(),
        ..Stat::default()
    };
    let req = Request::new(4, TCall::WStat { fid: 2, stat: stat.clone() });
    let bytes = encode_to_vec(&req);

    // op + tag + fid, then the stat's self-size with no extra wrapper.
    let inner = u16::from_le_bytes([bytes[7], bytes[8]]);
    assert_eq!(inner, stat.size());
    assert_eq!(bytes.len(), 3 + 4 + 2 + stat.size() as usize);

    let decoded: Request = decode_from(&bytes).unwrap();
    assert_eq!(decoded, req);
}

#[test]
fn version_tag_is_immutable_on_the_wire() {
    // Even a hand-built request with a stray tag goes out untagged.
    let req = Request {
        tag: 0x1234,
        body: TCall::Version {
            msize: 64,
            version: P92000.to_owned(),
        },
    };
    let bytes = encode_to_vec(&req);
    assert_eq!(&bytes[1..3], &[0xff, 0xff]);
}

#[test]
fn round_trip_every_operation() {
    let qid = QId {
        typ: QIdType::DIR,
        version: 1,
        path: 99,
    };
    let stat = Stat {
        name: "adm".to_owned(),
        uid: "adm".to_owned(),
        gid: "adm".to_owned(),
        muid: "none".to_owned(),
        ..Stat::default()
    };

    let requests = vec![
        Request::version(DEFAULT_MSIZE, P92000),
        Request::new(
            1,
            TCall::Auth {
                afid: 10,
                uname: "glenda".to_owned(),
                aname: "/".to_owned(),
            },
        ),
        Request::new(
            2,
            TCall::Attach {
                fid: 1,
                afid: NOFID,
                uname: "glenda".to_owned(),
                aname: "/".to_owned(),
            },
        ),
        Request::new(3, TCall::Error),
        Request::new(4, TCall::Flush { oldtag: 2 }),
        Request::new(
            5,
            TCall::Walk {
                fid: 1,
                newfid: 2,
                wname: vec!["usr".to_owned(), "glenda".to_owned()],
            },
        ),
        Request::new(
            6,
            TCall::Open {
                fid: 2,
                mode: om::RDWR | om::TRUNC,
            },
        ),
        Request::new(
            7,
            TCall::Create {
                fid: 2,
                name: "draft".to_owned(),
                perm: 0o644,
                mode: om::WRITE,
            },
        ),
        Request::new(
            8,
            TCall::Read {
                fid: 2,
                offset: 512,
                count: 4096,
            },
        ),
        Request::new(
            9,
            TCall::Write {
                fid: 2,
                offset: 512,
                data: Data(vec![0xde, 0xad, 0xbe, 0xef]),
            },
        ),
        Request::new(10, TCall::Clunk { fid: 2 }),
        Request::new(11, TCall::Remove { fid: 2 }),
        Request::new(12, TCall::Stat { fid: 1 }),
        Request::new(
            13,
            TCall::WStat {
                fid: 1,
                stat: stat.clone(),
            },
        ),
    ];
    for req in requests {
        let bytes = encode_to_vec(&req);
        let decoded: Request = decode_from(&bytes).unwrap();
        assert_eq!(req, decoded);

        // Dispatch through the two-way union lands on the same value.
        match decode_from::<Interaction>(&bytes).unwrap() {
            Interaction::Request(r) => assert_eq!(r, req),
            Interaction::Response(r) => panic!("{r:?} is not a request"),
        }
    }

    let responses = vec![
        Response::new(
            NOTAG,
            RCall::Version {
                msize: DEFAULT_MSIZE,
                version: P92000.to_owned(),
            },
        ),
        Response::new(1, RCall::Auth { aqid: qid }),
        Response::new(2, RCall::Attach { qid }),
        Response::error(3, "permission denied"),
        Response::new(4, RCall::Flush),
        Response::new(5, RCall::Walk { wqid: vec![qid, qid] }),
        Response::new(6, RCall::Open { qid, iounit: 8168 }),
        Response::new(7, RCall::Create { qid, iounit: 8168 }),
        Response::new(
            8,
            RCall::Read {
                data: Data(b"hello".to_vec()),
            },
        ),
        Response::new(9, RCall::Write { count: 4 }),
        Response::new(10, RCall::Clunk),
        Response::new(11, RCall::Remove),
        Response::new(12, RCall::Stat { stat }),
        Response::new(13, RCall::WStat),
    ];
    for resp in responses {
        let bytes = encode_to_vec(&resp);
        let decoded: Response = decode_from(&bytes).unwrap();
        assert_eq!(resp, decoded);

        match decode_from::<Interaction>(&bytes).unwrap() {
            Interaction::Response(r) => assert_eq!(r, resp),
            Interaction::Request(r) => panic!("{r:?} is not a response"),
        }
    }
}

#[test]
fn encoded_length_matches_field_sizes() {
    let req = Request::new(
        5,
        TCall::Walk {
            fid: 1,
            newfid: 2,
            wname: vec!["usr".to_owned(), "glenda".to_owned()],
        },
    );
    // header(3) + fid(4) + newfid(4) + count(2) + 2 strings
    assert_eq!(encode_to_vec(&req).len(), 3 + 4 + 4 + 2 + (2 + 3) + (2 + 6));

    let resp = Response::new(
        8,
        RCall::Read {
            data: Data(vec![0; 300]),
        },
    );
    // header(3) + count(4) + payload
    assert_eq!(encode_to_vec(&resp).len(), 3 + 4 + 300);
}
