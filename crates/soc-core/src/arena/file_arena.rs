use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use super::error::ArenaError;
use super::token::{ArenaBacking, Token};

/// Default window size kept in memory at any one time.
const DEFAULT_WINDOW_CAP: usize = 64 * 1024;

struct Window {
    /// Absolute virtual offset where `buf` begins.
    start: usize,
    buf: Vec<u8>,
}

struct Inner {
    backing: Option<File>,
    size: usize,
    window: Window,
    cap: usize,
}

/// A file-backed arena over a fixed-size virtual byte space `[0, size)`.
///
/// Reads slide a window of `cap` bytes over the backing file, re-centering
/// on whichever range was last requested. All window moves go through a
/// single mutex (§5: arenas may be safely shared for read-only loads).
pub struct FileArena {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for FileArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileArena").finish()
    }
}

impl FileArena {
    pub fn open(mut file: File) -> Result<Arc<Self>, ArenaError> {
        let size = file.seek(SeekFrom::End(0))? as usize;
        file.seek(SeekFrom::Start(0))?;
        Ok(Arc::new(FileArena {
            inner: Mutex::new(Inner {
                backing: Some(file),
                size,
                window: Window {
                    start: 0,
                    buf: Vec::new(),
                },
                cap: DEFAULT_WINDOW_CAP,
            }),
        }))
    }

    pub fn with_capacity(file: File, cap: usize) -> Result<Arc<Self>, ArenaError> {
        let arena = Self::open(file)?;
        arena.inner.lock().expect("file arena mutex poisoned").cap = cap.max(1);
        Ok(arena)
    }

    /// An empty arena with no backing file, representing "store does not exist".
    pub fn empty() -> Arc<Self> {
        Arc::new(FileArena {
            inner: Mutex::new(Inner {
                backing: None,
                size: 0,
                window: Window {
                    start: 0,
                    buf: Vec::new(),
                },
                cap: DEFAULT_WINDOW_CAP,
            }),
        })
    }

    pub fn ref_token(self: &Arc<Self>, start: usize, end: usize) -> Token {
        let size = self.size();
        let start = start.min(size);
        let end = end.clamp(start, size);
        Token::new(self.clone() as Arc<dyn ArenaBacking>, start, end)
    }

    /// Closes the underlying file, if any. Further loads return `ArenaError::Closed`.
    pub fn close(&self) {
        let mut inner = self.inner.lock().expect("file arena mutex poisoned");
        inner.backing = None;
        inner.window.buf.clear();
    }

    fn load(&self, start: usize, end: usize) -> Result<Vec<u8>, ArenaError> {
        let mut inner = self.inner.lock().expect("file arena mutex poisoned");
        let end = end.min(inner.size);
        let start = start.min(end);
        if start == end {
            return Ok(Vec::new());
        }

        let requested_len = end - start;
        if requested_len > inner.cap {
            // Serve the longest valid prefix from a window anchored at `start`.
            let prefix_end = (start + inner.cap).min(inner.size);
            let prefix = Self::load_uncached(&mut inner, start, prefix_end)?;
            return Err(ArenaError::LargeRead { prefix });
        }

        let win_start = inner.window.start;
        let win_end = win_start + inner.window.buf.len();
        if start >= win_start && end <= win_end {
            let rel_start = start - win_start;
            let rel_end = end - win_start;
            return Ok(inner.window.buf[rel_start..rel_end].to_vec());
        }

        // Recenter the window on the requested range, not spilling past EOF.
        let cap = inner.cap;
        let new_start = start;
        let new_end = (new_start + cap).max(end).min(inner.size).max(new_start);
        let data = Self::load_uncached(&mut inner, new_start, new_end)?;
        inner.window = Window {
            start: new_start,
            buf: data.clone(),
        };
        let rel_start = start - new_start;
        let rel_end = end - new_start;
        Ok(data[rel_start..rel_end.min(data.len())].to_vec())
    }

    fn load_uncached(inner: &mut Inner, start: usize, end: usize) -> Result<Vec<u8>, ArenaError> {
        let backing = inner.backing.as_mut().ok_or(ArenaError::Closed)?;
        let len = end.saturating_sub(start);
        let mut buf = vec![0u8; len];
        backing.seek(SeekFrom::Start(start as u64))?;
        let mut read_total = 0;
        while read_total < len {
            let n = backing.read(&mut buf[read_total..])?;
            if n == 0 {
                // EOF collapses to nil error provided the request itself fit.
                buf.truncate(read_total);
                break;
            }
            read_total += n;
        }
        Ok(buf)
    }
}

impl ArenaBacking for FileArena {
    fn size(&self) -> usize {
        self.inner.lock().expect("file arena mutex poisoned").size
    }

    fn bytes(&self, start: usize, end: usize) -> Result<Vec<u8>, ArenaError> {
        self.load(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(contents: &[u8]) -> File {
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(contents).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();
        f
    }

    #[test]
    fn reads_within_window() {
        let arena = FileArena::open(file_with(b"hello world")).unwrap();
        let tok = arena.ref_token(0, 5);
        assert_eq!(tok.bytes().unwrap(), b"hello");
    }

    #[test]
    fn window_recenters_on_far_reads() {
        let data: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
        let arena = FileArena::with_capacity(file_with(&data), 16).unwrap();
        let tok = arena.ref_token(0, 10);
        assert_eq!(tok.bytes().unwrap(), &data[0..10]);
        let tok2 = arena.ref_token(150, 160);
        assert_eq!(tok2.bytes().unwrap(), &data[150..160]);
    }

    #[test]
    fn large_read_returns_prefix_and_error() {
        let data: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
        let arena = FileArena::with_capacity(file_with(&data), 16).unwrap();
        let tok = arena.ref_token(0, 100);
        match tok.bytes() {
            Err(ArenaError::LargeRead { prefix }) => {
                assert_eq!(prefix, &data[0..16]);
            }
            other => panic!("expected LargeRead, got {other:?}"),
        }
    }

    #[test]
    fn close_then_read_errors() {
        let arena = FileArena::open(file_with(b"hello")).unwrap();
        let tok = arena.ref_token(0, 5);
        arena.close();
        assert!(matches!(tok.bytes(), Err(ArenaError::Closed)));
    }

    #[test]
    fn ref_clips_to_size() {
        let arena = FileArena::open(file_with(b"hello")).unwrap();
        let tok = arena.ref_token(2, 1000);
        assert_eq!(tok.bytes().unwrap(), b"llo");
    }
}
