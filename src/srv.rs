//! Synchronous server side 9P library.
//!
//! # Protocol
//! 9P2000

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};

use crate::conn::Connection;
use crate::error::Result;
use crate::fcall::*;

/// Per-operation request handlers for a 9P2000 server.
///
/// Every method has a default implementation answering
/// `Rerror "<operation> unimplemented"` with the request's tag, so an
/// implementor only provides the operations its service supports. A
/// handler cannot fail: protocol-level failures are stated by returning
/// [`Response::error`], which the loop frames back like any other reply.
///
/// # Example
/// ```no_run
/// use styx::srv::Handler;
/// use styx::{negotiate, QId, QIdType, RCall, Response};
///
/// struct HelloFs;
///
/// impl Handler for HelloFs {
///     fn version(&mut self, tag: u16, msize: u32, version: &str) -> Response {
///         let (msize, version) = negotiate(msize, version);
///         Response::new(tag, RCall::Version { msize, version })
///     }
///
///     fn attach(
///         &mut self,
///         tag: u16,
///         _fid: u32,
///         _afid: u32,
///         _uname: &str,
///         _aname: &str,
///     ) -> Response {
///         let qid = QId { typ: QIdType::DIR, version: 0, path: 0 };
///         Response::new(tag, RCall::Attach { qid })
///     }
/// }
/// ```
pub trait Handler {
    /// Negotiate the protocol version and maximum frame size.
    ///
    /// Most implementations answer via [`negotiate`]; the request always
    /// arrives with `tag == NOTAG`.
    fn version(&mut self, tag: u16, _msize: u32, _version: &str) -> Response {
        Response::error(tag, "version unimplemented")
    }

    /// Begin an authentication exchange on `afid`.
    fn auth(&mut self, tag: u16, _afid: u32, _uname: &str, _aname: &str) -> Response {
        Response::error(tag, "auth unimplemented")
    }

    /// Associate `fid` with the root of the served tree.
    fn attach(&mut self, tag: u16, _fid: u32, _afid: u32, _uname: &str, _aname: &str) -> Response {
        Response::error(tag, "attach unimplemented")
    }

    /// Abort the outstanding request tagged `oldtag`.
    ///
    /// The loop itself never cancels work; whether anything is abortable
    /// is the handler's business.
    fn flush(&mut self, tag: u16, _oldtag: u16) -> Response {
        Response::error(tag, "flush unimplemented")
    }

    /// Walk `wname` from `fid`, binding the destination to `newfid`.
    ///
    /// An empty `wname` is a fid clone.
    fn walk(&mut self, tag: u16, _fid: u32, _newfid: u32, _wname: &[String]) -> Response {
        Response::error(tag, "walk unimplemented")
    }

    /// Open the file `fid` names with the given [`om`](crate::fcall::om) mode.
    fn open(&mut self, tag: u16, _fid: u32, _mode: u8) -> Response {
        Response::error(tag, "open unimplemented")
    }

    /// Create `name` in the directory `fid` names, then open it.
    fn create(&mut self, tag: u16, _fid: u32, _name: &str, _perm: u32, _mode: u8) -> Response {
        Response::error(tag, "create unimplemented")
    }

    /// Read up to `count` bytes at `offset`.
    fn read(&mut self, tag: u16, _fid: u32, _offset: u64, _count: u32) -> Response {
        Response::error(tag, "read unimplemented")
    }

    /// Write `data` at `offset`.
    fn write(&mut self, tag: u16, _fid: u32, _offset: u64, _data: &[u8]) -> Response {
        Response::error(tag, "write unimplemented")
    }

    /// Release `fid`.
    fn clunk(&mut self, tag: u16, _fid: u32) -> Response {
        Response::error(tag, "clunk unimplemented")
    }

    /// Remove the file `fid` names and release the fid.
    fn remove(&mut self, tag: u16, _fid: u32) -> Response {
        Response::error(tag, "remove unimplemented")
    }

    /// Report the metadata of the file `fid` names.
    fn stat(&mut self, tag: u16, _fid: u32) -> Response {
        Response::error(tag, "stat unimplemented")
    }

    /// Rewrite the metadata of the file `fid` names.
    fn wstat(&mut self, tag: u16, _fid: u32, _stat: &Stat) -> Response {
        Response::error(tag, "wstat unimplemented")
    }
}

/// Cooperative stop signal for a running [`Server`].
///
/// Cloneable; a handler or another thread raises it and the loop exits
/// after the reply in flight has been written.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the server to stop after the next reply.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A single-connection, synchronous 9P2000 server.
///
/// One request is read, dispatched, and answered at a time; replies leave
/// the transport in request order. Any decode, encode, or transport error
/// is fatal to the connection and ends [`serve`](Server::serve).
#[derive(Debug)]
pub struct Server<T, H> {
    conn: Connection<T>,
    handler: H,
    running: Arc<AtomicBool>,
}

impl<T: Read + Write, H: Handler> Server<T, H> {
    pub fn new(transport: T, handler: H) -> Server<T, H> {
        Server {
            conn: Connection::new(transport),
            handler,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A signal that stops this server cooperatively.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.running.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable access to the handler, e.g. to hand it a [`StopHandle`]
    /// before serving.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Run the read-dispatch-reply cycle until stopped or the connection
    /// fails.
    ///
    /// A clean [`StopHandle::stop`] returns `Ok(())`; everything else ends
    /// with the error that broke the connection. Once a read has failed
    /// the stream state is indeterminate and the connection is done.
    pub fn serve(&mut self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let outcome = self.run();
        self.running.store(false, Ordering::SeqCst);
        if let Err(ref e) = outcome {
            error!("connection terminated: {e}");
        }
        outcome
    }

    fn run(&mut self) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            let req: Request = self.conn.recv()?;
            info!("← {req:?}");
            let resp = self.dispatch(req);
            info!("→ {resp:?}");
            self.conn.send(&resp)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, req: Request) -> Response {
        let tag = req.tag;
        match req.body {
            TCall::Version {
                msize,
                ref version,
            } => self.handler.version(tag, msize, version),
            TCall::Auth {
                afid,
                ref uname,
                ref aname,
            } => self.handler.auth(tag, afid, uname, aname),
            TCall::Attach {
                fid,
                afid,
                ref uname,
                ref aname,
            } => self.handler.attach(tag, fid, afid, uname, aname),
            TCall::Flush { oldtag } => self.handler.flush(tag, oldtag),
            TCall::Walk {
                fid,
                newfid,
                ref wname,
            } => self.handler.walk(tag, fid, newfid, wname),
            TCall::Open { fid, mode } => self.handler.open(tag, fid, mode),
            TCall::Create {
                fid,
                ref name,
                perm,
                mode,
            } => self.handler.create(tag, fid, name, perm, mode),
            TCall::Read { fid, offset, count } => self.handler.read(tag, fid, offset, count),
            TCall::Write {
                fid,
                offset,
                ref data,
            } => self.handler.write(tag, fid, offset, &data.0),
            TCall::Clunk { fid } => self.handler.clunk(tag, fid),
            TCall::Remove { fid } => self.handler.remove(tag, fid),
            TCall::Stat { fid } => self.handler.stat(tag, fid),
            TCall::WStat { fid, ref stat } => self.handler.wstat(tag, fid, stat),
            // These two are answered by the loop and cannot be overridden.
            TCall::Error => Response::error(tag, "illegal request of an error"),
            TCall::Undefined => Response::error(tag, "undefined request type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, Error};
    use std::io::{self, Cursor};
    use std::sync::Mutex;

    /// Write half of the in-memory transport, shared with the test body.
    #[derive(Clone, Debug, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn take(&self) -> Vec<u8> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: SharedBuf,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn script(requests: &[Request]) -> (Duplex, SharedBuf) {
        let mut conn = Connection::new(Cursor::new(Vec::new()));
        for req in requests {
            conn.send(req).unwrap();
        }
        let output = SharedBuf::default();
        let duplex = Duplex {
            input: Cursor::new(conn.into_inner().into_inner()),
            output: output.clone(),
        };
        (duplex, output)
    }

    fn replies(bytes: Vec<u8>) -> Vec<Response> {
        let mut conn = Connection::new(Cursor::new(bytes));
        let mut out = Vec::new();
        while let Ok(resp) = conn.recv::<Response>() {
            out.push(resp);
        }
        out
    }

    #[derive(Default)]
    struct TestFs {
        stop: Option<StopHandle>,
        clunked: Vec<u32>,
    }

    impl Handler for TestFs {
        fn version(&mut self, tag: u16, msize: u32, version: &str) -> Response {
            let (msize, version) = negotiate(msize, version);
            Response::new(tag, RCall::Version { msize, version })
        }

        fn clunk(&mut self, tag: u16, fid: u32) -> Response {
            self.clunked.push(fid);
            if let Some(ref stop) = self.stop {
                stop.stop();
            }
            Response::new(tag, RCall::Clunk)
        }
    }

    struct Unimplemented;
    impl Handler for Unimplemented {}

    #[test]
    fn defaults_answer_unimplemented() {
        let (duplex, output) = script(&[
            Request::new(1, TCall::Open { fid: 1, mode: om::READ }),
            Request::new(2, TCall::Stat { fid: 1 }),
            Request::new(3, TCall::Error),
        ]);
        let mut server = Server::new(duplex, Unimplemented);

        // Input runs dry after the scripted requests.
        match server.serve().unwrap_err() {
            Error::Decode(DecodeError::ShortRead) => {}
            e => panic!("unexpected error: {e:?}"),
        }
        assert!(!server.is_running());

        let replies = replies(output.take());
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], Response::error(1, "open unimplemented"));
        assert_eq!(replies[1], Response::error(2, "stat unimplemented"));
        assert_eq!(replies[2], Response::error(3, "illegal request of an error"));
    }

    #[test]
    fn overridden_handlers_reply_in_order() {
        let (duplex, output) = script(&[
            Request::version(u32::MAX, "9P2000.L"),
            Request::new(7, TCall::Clunk { fid: 0x42 }),
        ]);
        let mut server = Server::new(duplex, TestFs::default());
        let _ = server.serve();

        assert_eq!(server.handler().clunked, vec![0x42]);
        let replies = replies(output.take());
        assert_eq!(
            replies[0],
            Response::new(
                NOTAG,
                RCall::Version {
                    msize: DEFAULT_MSIZE,
                    version: P92000.to_owned(),
                }
            )
        );
        assert_eq!(replies[1], Response::new(7, RCall::Clunk));
    }

    #[test]
    fn stop_takes_effect_after_the_reply() {
        let (duplex, output) = script(&[
            Request::new(1, TCall::Clunk { fid: 1 }),
            Request::new(2, TCall::Clunk { fid: 2 }),
        ]);
        let mut server = Server::new(duplex, TestFs::default());
        let stop = server.stop_handle();
        server.handler_mut().stop = Some(stop);

        // The handler stops the server on the first clunk; the second
        // request is never read and serve returns cleanly.
        server.serve().unwrap();
        assert_eq!(server.handler().clunked, vec![1]);
        assert_eq!(replies(output.take()).len(), 1);
    }

    #[test]
    fn decode_errors_are_fatal() {
        let output = SharedBuf::default();
        let duplex = Duplex {
            // A framed message whose opcode is not a 9P operation.
            input: Cursor::new(vec![0x08, 0x00, 0x00, 0x00, 0x42, 0x00, 0x00, 0x00]),
            output: output.clone(),
        };
        let mut server = Server::new(duplex, Unimplemented);
        match server.serve().unwrap_err() {
            Error::Decode(DecodeError::UnknownOpcode(0x42)) => {}
            e => panic!("unexpected error: {e:?}"),
        }
        assert!(output.take().is_empty());
    }
}
