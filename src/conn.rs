//! Length-prefixed framing over any `Read`/`Write` byte stream.
//!
//! Every 9P message travels inside a frame whose first four bytes are the
//! little-endian total length, the length field included. The framer moves
//! whole frames; it never interprets the bytes past the length field —
//! message dispatch belongs to the codec.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::error::{DecodeError, EncodeError, Error, Result};
use crate::serialize::{Decodable, Encodable};
use crate::stream::MessageStream;

/// A message-oriented wrapper over a bidirectional byte stream.
///
/// The stream only needs blocking `read`/`write`; `UnixStream`, a
/// [`FdTransport`](crate::transport::FdTransport), or an in-memory pipe
/// all qualify.
#[derive(Debug)]
pub struct Connection<T> {
    transport: T,
}

impl<T> Connection<T> {
    pub fn new(transport: T) -> Connection<T> {
        Connection { transport }
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Read + Write> Connection<T> {
    /// Frame and write one message.
    ///
    /// The message is encoded into a scratch buffer first so the length
    /// field can be computed, then the whole frame goes out in a single
    /// `write_all`: no partial frame is ever interleaved on the transport.
    pub fn send<M: Encodable>(&mut self, msg: &M) -> Result<()> {
        let mut body = MessageStream::new();
        msg.encode(&mut body)?;
        let body = body.take_bytes();

        let total = body.len() + 4;
        let total32 =
            u32::try_from(total).map_err(|_| EncodeError::LengthOverflow(total))?;

        let mut frame = MessageStream::new();
        frame.put_u32(total32);
        frame.write_bytes(&body);
        self.transport.write_all(frame.as_bytes())?;
        self.transport.flush()?;
        trace!("sent frame of {total} bytes");
        Ok(())
    }

    /// Read one frame and decode the message inside it.
    ///
    /// Running out of bytes mid-frame is a [`DecodeError::ShortRead`]; any
    /// other stream failure surfaces as [`Error::Transport`]. The decoded
    /// message must account for the whole frame.
    pub fn recv<M: Decodable>(&mut self) -> Result<M> {
        let mut head = [0u8; 4];
        self.transport.read_exact(&mut head).map_err(Error::from_read)?;
        let total = LittleEndian::read_u32(&head);
        if total < 4 {
            return Err(DecodeError::MalformedFrame(total).into());
        }

        let mut body = vec![0u8; (total - 4) as usize];
        self.transport.read_exact(&mut body).map_err(Error::from_read)?;
        trace!("received frame of {total} bytes");

        let mut stream = MessageStream::new();
        stream.load_bytes(body);
        let msg = M::decode(&mut stream)?;
        if stream.remaining() != 0 {
            return Err(DecodeError::SizeMismatch.into());
        }
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcall::*;
    use std::io::Cursor;

    fn framed<M: Encodable>(msg: &M) -> Vec<u8> {
        let mut conn = Connection::new(Cursor::new(Vec::new()));
        conn.send(msg).unwrap();
        conn.into_inner().into_inner()
    }

    #[test]
    fn frame_length_covers_itself() {
        let bytes = framed(&Request::version(8192, P92000));
        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[..4], &[0x13, 0x00, 0x00, 0x00]);
        assert_eq!(bytes[4], MsgType::TVersion as u8);
    }

    #[test]
    fn framed_scenarios() {
        let clunk = framed(&Request::new(0x0007, TCall::Clunk { fid: 0x42 }));
        assert_eq!(
            clunk,
            [0x0b, 0x00, 0x00, 0x00, 0x78, 0x07, 0x00, 0x42, 0x00, 0x00, 0x00]
        );

        let error = framed(&Response::error(0x0003, "perm"));
        assert_eq!(
            error,
            [0x0d, 0x00, 0x00, 0x00, 0x6b, 0x03, 0x00, 0x04, 0x00, 0x70, 0x65, 0x72, 0x6d]
        );

        let read = framed(&Response::new(1, RCall::Read { data: Data(vec![]) }));
        assert_eq!(
            read,
            [0x0b, 0x00, 0x00, 0x00, 0x75, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]
        );

        let walk = framed(&Response::new(
            2,
            RCall::Walk {
                wqid: vec![QId {
                    typ: QIdType::DIR,
                    version: 1,
                    path: 0x1234,
                }],
            },
        ));
        assert_eq!(&walk[..4], &[0x16, 0x00, 0x00, 0x00]);
        assert_eq!(walk.len(), 0x16);
    }

    #[test]
    fn round_trip_through_a_frame() {
        let req = Request::new(
            5,
            TCall::Write {
                fid: 9,
                offset: 128,
                data: Data(vec![1, 2, 3]),
            },
        );
        let mut conn = Connection::new(Cursor::new(framed(&req)));
        let decoded: Request = conn.recv().unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn two_frames_back_to_back() {
        let first = Request::new(1, TCall::Stat { fid: 4 });
        let second = Request::new(2, TCall::Clunk { fid: 4 });
        let mut bytes = framed(&first);
        bytes.extend_from_slice(&framed(&second));

        let mut conn = Connection::new(Cursor::new(bytes));
        let a: Request = conn.recv().unwrap();
        let b: Request = conn.recv().unwrap();
        assert_eq!(a, first);
        assert_eq!(b, second);

        // Nothing remains between or after the frames.
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::ShortRead) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn truncated_header_is_a_short_read() {
        let mut conn = Connection::new(Cursor::new(vec![0x0b, 0x00]));
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::ShortRead) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn truncated_body_is_a_short_read() {
        let mut bytes = framed(&Request::new(1, TCall::Clunk { fid: 1 }));
        bytes.truncate(bytes.len() - 2);
        let mut conn = Connection::new(Cursor::new(bytes));
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::ShortRead) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn undersized_length_field_is_malformed() {
        let mut conn = Connection::new(Cursor::new(vec![0x03, 0x00, 0x00, 0x00, 0x78]));
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::MalformedFrame(3)) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn trailing_bytes_inside_a_frame_are_rejected() {
        let mut bytes = framed(&Request::new(1, TCall::Clunk { fid: 1 }));
        // Claim one extra byte in the frame and supply it.
        bytes.push(0xaa);
        let total = (bytes.len()) as u32;
        bytes[..4].copy_from_slice(&total.to_le_bytes());
        let mut conn = Connection::new(Cursor::new(bytes));
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::SizeMismatch) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn undefined_opcode_inside_a_frame() {
        // Frame of 8 bytes whose first post-length byte is 0x42.
        let bytes = vec![0x08, 0x00, 0x00, 0x00, 0x42, 0x00, 0x00, 0x00];
        let mut conn = Connection::new(Cursor::new(bytes));
        match conn.recv::<Request>().unwrap_err() {
            Error::Decode(DecodeError::UnknownOpcode(0x42)) => {}
            e => panic!("unexpected error: {e:?}"),
        }
    }
}
