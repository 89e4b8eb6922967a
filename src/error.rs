//! Error types shared by the codec, framer, and server.

use std::io;

use thiserror::Error;

use crate::fcall::MAXWELEM;

/// Alias for `Result<T, styx::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while serializing a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A string, sequence, or payload does not fit its wire length field.
    #[error("length {0} overflows the wire length field")]
    LengthOverflow(usize),

    /// The message is a default-constructed placeholder carrying no opcode.
    #[error("cannot encode an undefined message")]
    UndefinedVariant,

    /// A walk names more path elements than the protocol allows.
    #[error("walk carries {0} names, at most {MAXWELEM} are allowed")]
    TooManyNames(usize),

    /// A fid-clone walk must introduce a fid distinct from the source.
    #[error("fid clone reuses fid {0}")]
    CloneSameFid(u32),
}

/// Errors raised while deserializing a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended before the field did.
    #[error("stream ended before the field did")]
    ShortRead,

    /// The outer frame length is smaller than the length field itself.
    #[error("frame length {0} is smaller than the length field itself")]
    MalformedFrame(u32),

    /// The peeked opcode names no 9P2000 operation.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// The opcode is valid but travels in the opposite direction.
    #[error("opcode {0:#04x} belongs to the opposite direction")]
    WrongDirection(u8),

    /// A string field holds bytes that are not valid UTF-8.
    #[error("string field is not valid utf-8")]
    InvalidString,

    /// A length field does not match the bytes that follow it.
    #[error("sized payload does not match its length field")]
    SizeMismatch,
}

/// Top-level error for connection-facing operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Any failure reported by the underlying byte stream.
    #[error("transport: {0}")]
    Transport(#[from] io::Error),
}

impl Error {
    /// Map an I/O failure from a framed read: running out of bytes is a
    /// protocol-level short read, anything else is the transport's fault.
    pub(crate) fn from_read(err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Decode(DecodeError::ShortRead)
        } else {
            Error::Transport(err)
        }
    }
}
