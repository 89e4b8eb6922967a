//! Byte-stream providers at the POSIX edge.
//!
//! The codec and framer only ever see `Read + Write`; these adapters are
//! how a real descriptor or Unix-domain socket becomes one. All `unsafe`
//! code in the crate is confined to this module.

#![allow(unsafe_code)]

use std::fs::{self, File, Permissions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use log::{info, warn};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::socket::{
    self, bind, connect, listen, socket, AddressFamily, Backlog, SockFlag, SockType, UnixAddr,
};

use crate::error::Result;

/// Pending-connection queue depth for announced sockets.
const BACKLOG: i32 = 32;

/// A connection over a plain file descriptor.
///
/// The transport owns the descriptor and closes it on drop; a caller that
/// needs the descriptor to outlive the transport reclaims it with
/// [`into_fd`](FdTransport::into_fd) instead.
#[derive(Debug)]
pub struct FdTransport {
    fd: File,
}

impl FdTransport {
    pub fn new(fd: OwnedFd) -> FdTransport {
        FdTransport { fd: fd.into() }
    }

    /// Take the descriptor back without closing it.
    pub fn into_fd(self) -> OwnedFd {
        self.fd.into()
    }
}

impl From<OwnedFd> for FdTransport {
    fn from(fd: OwnedFd) -> FdTransport {
        FdTransport::new(fd)
    }
}

impl Read for FdTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fd.read(buf)
    }
}

impl Write for FdTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.fd.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.fd.flush()
    }
}

/// Connect to a 9P server listening on a Unix-domain socket.
///
/// Fails if `path` does not fit in `sun_path`.
pub fn dial(path: impl AsRef<Path>) -> Result<UnixStream> {
    let path = path.as_ref();
    let addr = UnixAddr::new(path).map_err(io::Error::from)?;
    let fd = socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )
    .map_err(io::Error::from)?;
    connect(fd.as_raw_fd(), &addr).map_err(io::Error::from)?;
    info!("dialed {}", path.display());
    Ok(UnixStream::from(fd))
}

/// A listening Unix-domain socket; removes its socket file on drop.
#[derive(Debug)]
pub struct Announcer {
    path: PathBuf,
    listener: UnixListener,
}

impl Announcer {
    /// Block until a client connects.
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _) = self.listener.accept()?;
        info!("accepted connection on {}", self.path.display());
        Ok(stream)
    }

    pub fn local_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to remove socket file {}: {e}", self.path.display());
        }
    }
}

/// Publish a listening Unix-domain socket at `path`.
///
/// Any stale socket file is unlinked first and the fresh one is restricted
/// to the owner. `SIGPIPE` is ignored process-wide so a peer hanging up
/// mid-write surfaces as `EPIPE` on the transport instead of killing the
/// process.
pub fn announce(path: impl AsRef<Path>) -> Result<Announcer> {
    let path = path.as_ref().to_owned();

    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }.map_err(io::Error::from)?;

    let addr = UnixAddr::new(&path).map_err(io::Error::from)?;
    let fd = socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )
    .map_err(io::Error::from)?;
    socket::setsockopt(&fd, socket::sockopt::ReuseAddr, &true).map_err(io::Error::from)?;

    // A leftover socket file from an earlier run would make bind fail.
    let _ = fs::remove_file(&path);
    bind(fd.as_raw_fd(), &addr).map_err(io::Error::from)?;
    fs::set_permissions(&path, Permissions::from_mode(0o700))?;
    let backlog = Backlog::new(BACKLOG).map_err(io::Error::from)?;
    listen(&fd, backlog).map_err(io::Error::from)?;
    info!("announced on {}", path.display());

    Ok(Announcer {
        path,
        listener: UnixListener::from(fd),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn scratch_socket(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("styx-{}-{}", name, std::process::id()))
    }

    #[test]
    fn fd_transport_moves_bytes() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut left = FdTransport::new(OwnedFd::from(a));
        let mut right = FdTransport::new(OwnedFd::from(b));

        left.write_all(b"styx").unwrap();
        left.flush().unwrap();
        let mut buf = [0u8; 4];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"styx");

        // Reclaiming the descriptor keeps it usable.
        let fd = left.into_fd();
        let mut stream = UnixStream::from(fd);
        stream.write_all(b"!").unwrap();
        let mut one = [0u8; 1];
        right.read_exact(&mut one).unwrap();
        assert_eq!(&one, b"!");
    }

    #[test]
    fn dial_rejects_oversized_paths() {
        let long = std::env::temp_dir().join("x".repeat(200));
        assert!(dial(&long).is_err());
    }

    #[test]
    fn announce_accept_dial() {
        let path = scratch_socket("announce");
        let announcer = announce(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);

        let client_path = path.clone();
        let client = thread::spawn(move || {
            let mut stream = dial(&client_path).unwrap();
            stream.write_all(b"ping").unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            buf
        });

        let mut served = announcer.accept().unwrap();
        let mut buf = [0u8; 4];
        served.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        served.write_all(b"pong").unwrap();

        assert_eq!(&client.join().unwrap(), b"pong");

        drop(announcer);
        assert!(!path.exists());
    }

    #[test]
    fn announce_replaces_a_stale_socket() {
        let path = scratch_socket("stale");
        fs::write(&path, b"not a socket").unwrap();
        let announcer = announce(&path).unwrap();
        drop(announcer);
        assert!(!path.exists());
    }
}
