#![deny(unsafe_code)]
//! Synchronous 9P2000 protocol library for Rust.
//!
//! This crate implements the classic Plan 9 file protocol: a byte-exact
//! codec for every 9P2000 message, length-prefixed framing over any
//! blocking byte stream, and a single-connection server loop that routes
//! decoded requests to per-operation handlers.
//!
//! # Overview
//!
//! The 9P protocol was developed for the Plan 9 distributed operating
//! system; everything a client can do to a file server is expressed as
//! one of fourteen request/response pairs. This crate speaks the base
//! 9P2000 dialect — not the 9P2000.u or 9P2000.L extensions.
//!
//! # Getting Started
//!
//! To serve 9P2000 on a connection, you need to:
//!
//! 1. Implement the [`srv::Handler`] trait for the operations your
//!    service supports (everything else answers "unimplemented")
//! 2. Obtain a byte stream — [`transport::announce`] +
//!    [`transport::Announcer::accept`] for a Unix-domain socket,
//!    [`transport::FdTransport`] for a descriptor you already hold, or
//!    any other `Read + Write` value
//! 3. Run [`srv::Server::serve`]
//!
//! # Example
//!
//! ```no_run
//! use styx::srv::{Handler, Server};
//! use styx::{negotiate, transport, RCall, Response, Result};
//!
//! struct HelloFs;
//!
//! impl Handler for HelloFs {
//!     fn version(&mut self, tag: u16, msize: u32, version: &str) -> Response {
//!         let (msize, version) = negotiate(msize, version);
//!         Response::new(tag, RCall::Version { msize, version })
//!     }
//!
//!     // Implement walk/open/read/... for a real service.
//! }
//!
//! fn main() -> Result<()> {
//!     let announcer = transport::announce("/tmp/hellofs.sock")?;
//!     let stream = announcer.accept()?;
//!     Server::new(stream, HelloFs).serve()
//! }
//! ```
//!
//! # Protocol Details
//!
//! ## Message Flow
//!
//! 1. **Version Negotiation**: the client sends `Tversion` (always with
//!    tag [`NOTAG`]), the server answers with an msize no larger than the
//!    client's and the largest version string it shares with the client,
//!    or `"unknown"`
//! 2. **Authentication** (optional): `Tauth`/`Rauth` exchange
//! 3. **Attach**: the client binds a fid to the served tree's root
//! 4. **Operations**: walk, open, create, read, write, stat, wstat
//! 5. **Cleanup**: fids are released with `Tclunk`
//!
//! ## Wire Format
//!
//! Every frame starts with a little-endian u32 holding the total length,
//! the length field included. Inside the frame: opcode byte, u16 tag,
//! then the operation's fields. Strings and sequences carry a u16 count;
//! read/write payloads carry a u32 count. Request opcodes are even and
//! each response opcode is the next odd value.
//!
//! # Error Handling
//!
//! Protocol failures flow to the peer as `Rerror` replies built with
//! [`Response::error`]; they are ordinary traffic. Library failures are
//! typed values: [`EncodeError`], [`DecodeError`], and [`Error`] with its
//! `Transport` arm. The server loop treats any decode, encode, or
//! transport failure as fatal to the connection.
//!
//! # Concurrency
//!
//! The core is deliberately synchronous and single-connection: one
//! read-dispatch-reply cycle at a time, with replies leaving the stream
//! in request order. Tag-level concurrency can be layered above this
//! core without touching the codec contract.

pub mod conn;
pub mod error;
pub mod fcall;
pub mod serialize;
pub mod srv;
pub mod stream;
pub mod transport;

pub use crate::conn::Connection;
pub use crate::error::{DecodeError, EncodeError, Error, Result};
pub use crate::fcall::*;
pub use crate::serialize::{Decodable, Encodable};
pub use crate::stream::MessageStream;
