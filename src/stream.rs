//! The in-memory byte buffer all messages are built in and taken apart from.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;

/// A growable byte buffer with an append-only write end and a read cursor.
///
/// Every message is encoded into and decoded out of one of these; the
/// stream owns no I/O. Writes always append and cannot fail. Reads advance
/// the cursor and report [`DecodeError::ShortRead`] when the buffer runs
/// out. Not thread-safe, and not meant to be: a stream belongs to whoever
/// is currently holding it.
#[derive(Debug, Default, Clone)]
pub struct MessageStream {
    buf: Vec<u8>,
    pos: usize,
}

impl MessageStream {
    pub fn new() -> MessageStream {
        MessageStream::default()
    }

    /// Total number of bytes held, read and unread alike.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes the read cursor has not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Look at the next unread byte without advancing the cursor.
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Drop all contents and rewind the cursor.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Take the whole buffer out, leaving the stream empty.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.pos = 0;
        std::mem::take(&mut self.buf)
    }

    /// Replace the contents with `bytes` and rewind the cursor.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) {
        self.buf = bytes;
        self.pos = 0;
    }

    /// View of everything written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Copy up to `out.len()` unread bytes into `out`, returning how many
    /// were actually available.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.remaining());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    /// Consume exactly `len` unread bytes or fail without advancing.
    pub fn read_exact(&mut self, len: usize) -> Result<&[u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::ShortRead);
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        let mut scratch = [0u8; 2];
        LittleEndian::write_u16(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
    }

    pub fn put_u32(&mut self, value: u32) {
        let mut scratch = [0u8; 4];
        LittleEndian::write_u32(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
    }

    pub fn put_u64(&mut self, value: u64) {
        let mut scratch = [0u8; 8];
        LittleEndian::write_u64(&mut scratch, value);
        self.buf.extend_from_slice(&scratch);
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.read_exact(2)?))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.read_exact(4)?))
    }

    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(LittleEndian::read_u64(self.read_exact(8)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut s = MessageStream::new();
        s.put_u16(0x1234);
        assert_eq!(s.as_bytes(), [0x34, 0x12]);
        s.reset();
        s.put_u32(0xdead_beef);
        assert_eq!(s.as_bytes(), [0xef, 0xbe, 0xad, 0xde]);
        s.reset();
        s.put_u64(0x0102_0304_0506_0708);
        assert_eq!(s.as_bytes(), [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn read_round_trips_write() {
        let mut s = MessageStream::new();
        s.put_u8(0xab);
        s.put_u16(515);
        s.put_u32(70000);
        s.put_u64(u64::MAX - 1);
        assert_eq!(s.get_u8().unwrap(), 0xab);
        assert_eq!(s.get_u16().unwrap(), 515);
        assert_eq!(s.get_u32().unwrap(), 70000);
        assert_eq!(s.get_u64().unwrap(), u64::MAX - 1);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn short_reads_do_not_advance() {
        let mut s = MessageStream::new();
        s.put_u8(1);
        assert_eq!(s.get_u32(), Err(DecodeError::ShortRead));
        assert_eq!(s.get_u8().unwrap(), 1);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut s = MessageStream::new();
        assert_eq!(s.peek(), None);
        s.put_u8(0x64);
        assert_eq!(s.peek(), Some(0x64));
        assert_eq!(s.peek(), Some(0x64));
        assert_eq!(s.get_u8().unwrap(), 0x64);
        assert_eq!(s.peek(), None);
    }

    #[test]
    fn take_and_load() {
        let mut s = MessageStream::new();
        s.put_u16(7);
        let bytes = s.take_bytes();
        assert_eq!(bytes, vec![7, 0]);
        assert!(s.is_empty());

        s.load_bytes(bytes);
        assert_eq!(s.get_u16().unwrap(), 7);
    }

    #[test]
    fn partial_read_bytes_reports_count() {
        let mut s = MessageStream::new();
        s.write_bytes(&[1, 2, 3]);
        let mut out = [0u8; 8];
        assert_eq!(s.read_bytes(&mut out), 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert_eq!(s.read_bytes(&mut out), 0);
    }
}
