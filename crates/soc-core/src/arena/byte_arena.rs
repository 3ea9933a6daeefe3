use std::sync::{Arc, Mutex};

use super::error::ArenaError;
use super::token::{ArenaBacking, Token};

/// A growable, in-memory arena. Bytes are appended by `write` and handed out
/// as tokens; `take` drains the buffer, invalidating any outstanding tokens'
/// ability to be read past what remains (their range is still valid since
/// the arena only ever grows before a `take`).
#[derive(Debug)]
pub struct ByteArena {
    inner: Mutex<Vec<u8>>,
}

impl ByteArena {
    pub fn new() -> Arc<Self> {
        Arc::new(ByteArena {
            inner: Mutex::new(Vec::new()),
        })
    }

    /// Appends `data` and returns a token referencing the newly written range.
    pub fn write(self: &Arc<Self>, data: &[u8]) -> Token {
        let mut buf = self.inner.lock().expect("byte arena mutex poisoned");
        let start = buf.len();
        buf.extend_from_slice(data);
        let end = buf.len();
        drop(buf);
        Token::new(self.clone() as Arc<dyn ArenaBacking>, start, end)
    }

    /// Returns a token referencing `[start, end)` of the buffer as currently written.
    pub fn ref_token(self: &Arc<Self>, start: usize, end: usize) -> Token {
        let size = self.size();
        let start = start.min(size);
        let end = end.clamp(start, size);
        Token::new(self.clone() as Arc<dyn ArenaBacking>, start, end)
    }

    /// Drains and returns everything written so far.
    pub fn take(&self) -> Vec<u8> {
        let mut buf = self.inner.lock().expect("byte arena mutex poisoned");
        std::mem::take(&mut *buf)
    }
}

impl ArenaBacking for ByteArena {
    fn size(&self) -> usize {
        self.inner.lock().expect("byte arena mutex poisoned").len()
    }

    fn bytes(&self, start: usize, end: usize) -> Result<Vec<u8>, ArenaError> {
        let buf = self.inner.lock().expect("byte arena mutex poisoned");
        if start > buf.len() || end > buf.len() {
            return Err(ArenaError::NoBacking);
        }
        Ok(buf[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let arena = ByteArena::new();
        let tok = arena.write(b"hello world");
        assert_eq!(tok.bytes().unwrap(), b"hello world");
    }

    #[test]
    fn two_writes_produce_disjoint_tokens() {
        let arena = ByteArena::new();
        let a = arena.write(b"abc");
        let b = arena.write(b"def");
        assert_eq!(a.bytes().unwrap(), b"abc");
        assert_eq!(b.bytes().unwrap(), b"def");
        assert_eq!(a.end, b.start);
    }

    #[test]
    fn ref_token_clips_to_size() {
        let arena = ByteArena::new();
        arena.write(b"abc");
        let tok = arena.ref_token(1, 100);
        assert_eq!(tok.bytes().unwrap(), b"bc");
    }
}
