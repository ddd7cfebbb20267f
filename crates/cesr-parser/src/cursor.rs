//! Read position over a shared immutable buffer.
//!
//! Every slice handed out is a `Bytes` view into the same allocation, so
//! carving messages and primitives out of a stream never copies.

use bytes::Bytes;
use cesr_core::{Cold, CoreError};

#[derive(Debug, Clone)]
pub struct Cursor {
    buf: Bytes,
    pos: usize,
    /// Stream offset of `buf[0]`; nonzero for cursors made by [`Cursor::split`].
    base: usize,
}

impl Cursor {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
            base: 0,
        }
    }

    /// Offset from the start of the stream.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Unread bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Classify the next unread byte.
    pub fn sniff(&self) -> Result<Cold, CoreError> {
        cesr_core::sniff(self.remaining())
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<Bytes, CoreError> {
        if n > self.len() {
            return Err(CoreError::InsufficientBytes {
                needed: n,
                available: self.len(),
            });
        }
        let out = self.buf.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(out)
    }

    /// Take the next `n` bytes as a cursor of their own.
    ///
    /// The new cursor keeps reporting positions relative to the stream.
    pub fn split(&mut self, n: usize) -> Result<Cursor, CoreError> {
        let base = self.position();
        let buf = self.take(n)?;
        Ok(Cursor { buf, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_is_zero_copy() {
        let buf = Bytes::from_static(b"-AABxyz");
        let mut cur = Cursor::new(buf.clone());
        let head = cur.take(4).unwrap();
        assert_eq!(&head[..], b"-AAB");
        assert_eq!(head.as_ptr(), buf.as_ptr());
        assert_eq!(cur.position(), 4);
        assert_eq!(cur.remaining(), b"xyz");
    }

    #[test]
    fn test_take_past_end() {
        let mut cur = Cursor::new(&b"abc"[..]);
        assert_eq!(
            cur.take(4),
            Err(CoreError::InsufficientBytes {
                needed: 4,
                available: 3
            })
        );
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_split() {
        let mut cur = Cursor::new(&b"abcdef"[..]);
        let mut inner = cur.split(4).unwrap();
        assert_eq!(inner.take(4).unwrap(), Bytes::from_static(b"abcd"));
        assert!(inner.is_empty());
        assert_eq!(cur.remaining(), b"ef");
    }

    #[test]
    fn test_split_keeps_stream_offsets() {
        let mut cur = Cursor::new(&b"-VABxyzw12"[..]);
        cur.take(4).unwrap();
        let mut block = cur.split(4).unwrap();
        assert_eq!(block.position(), 4);
        block.take(3).unwrap();
        assert_eq!(block.position(), 7);
        assert_eq!(block.len(), 1);
        assert_eq!(cur.position(), 8);

        let mut nested = block.split(1).unwrap();
        assert_eq!(nested.position(), 7);
        assert_eq!(nested.take(1).unwrap(), Bytes::from_static(b"w"));
        assert_eq!(nested.position(), 8);
    }
}
