use std::sync::Arc;

use super::byte_arena::ByteArena;
use super::error::ArenaError;
use super::token::{ArenaBacking, Token};

/// A cursor into an [`Editor`]'s content sequence, tracked by absolute
/// logical offset. Stable across mutation: insertions/removals elsewhere in
/// the sequence shift the location so it keeps referring to "the same byte"
/// (or the nearest surviving neighbor once its own byte has been removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorId(usize);

struct Cursor {
    location: usize,
}

/// An ordered sequence of content tokens (possibly spanning multiple
/// arenas), plus an internal scratch arena for newly-written content and a
/// set of tracked cursors.
pub struct Editor {
    content: Vec<Token>,
    scratch: Arc<ByteArena>,
    cursors: Vec<Cursor>,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteToError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Editor {
    pub fn new() -> Self {
        Editor {
            content: Vec::new(),
            scratch: ByteArena::new(),
            cursors: Vec::new(),
        }
    }

    pub fn content(&self) -> &[Token] {
        &self.content
    }

    pub fn total_len(&self) -> usize {
        self.content.iter().map(Token::len).sum()
    }

    /// Appends a token to the end of the content sequence, unconditionally.
    pub fn append(&mut self, token: Token) {
        if !token.is_empty() {
            self.content.push(token);
        }
    }

    /// Writes `bytes` into the internal scratch arena and appends the
    /// resulting token to the content sequence.
    pub fn write(&mut self, bytes: &[u8]) -> Token {
        let token = self.scratch.write(bytes);
        self.append(token.clone());
        token
    }

    /// Creates a cursor at logical offset `location` (clamped to content length).
    pub fn cursor_at(&mut self, location: usize) -> CursorId {
        let loc = location.min(self.total_len());
        self.cursors.push(Cursor { location: loc });
        CursorId(self.cursors.len() - 1)
    }

    pub fn location(&self, id: CursorId) -> usize {
        self.cursors[id.0].location
    }

    /// Moves a cursor to an absolute logical location.
    pub fn to(&mut self, id: CursorId, location: usize) {
        self.cursors[id.0].location = location.min(self.total_len());
    }

    /// Moves a cursor by a relative delta, clamped to content bounds.
    pub fn by(&mut self, id: CursorId, delta: i64) {
        let total = self.total_len() as i64;
        let cur = self.cursors[id.0].location as i64;
        self.cursors[id.0].location = (cur + delta).clamp(0, total) as usize;
    }

    /// Writes `bytes` at the cursor's current location (insert-at-cursor).
    pub fn write_at(&mut self, id: CursorId, bytes: &[u8]) {
        let token = self.scratch.write(bytes);
        self.insert(id, [token]);
    }

    pub fn write_string_at(&mut self, id: CursorId, s: &str) {
        self.write_at(id, s.as_bytes());
    }

    /// Inserts `tokens` at the cursor's location, splitting the content
    /// token it points into if the location is interior to one.
    pub fn insert<I: IntoIterator<Item = Token>>(&mut self, id: CursorId, tokens: I) {
        let loc = self.cursors[id.0].location;
        let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.is_empty()).collect();
        let inserted_len: usize = tokens.iter().map(Token::len).sum();
        if inserted_len == 0 {
            return;
        }

        let mut acc = 0usize;
        let mut insert_pos = self.content.len();
        let mut split: Option<(usize, usize)> = None;
        for (i, t) in self.content.iter().enumerate() {
            let tlen = t.len();
            if loc < acc + tlen {
                if loc == acc {
                    insert_pos = i;
                } else {
                    split = Some((i, loc - acc));
                }
                break;
            }
            acc += tlen;
            insert_pos = i + 1;
        }

        if let Some((i, rel)) = split {
            let at = self.content[i].start + rel;
            let (head, tail) = self.content[i].split_at(at);
            let mut new_content = Vec::with_capacity(self.content.len() + tokens.len() + 1);
            new_content.extend_from_slice(&self.content[..i]);
            new_content.push(head);
            new_content.extend(tokens.iter().cloned());
            new_content.push(tail);
            new_content.extend_from_slice(&self.content[i + 1..]);
            self.content = new_content;
        } else {
            let mut new_content = Vec::with_capacity(self.content.len() + tokens.len());
            new_content.extend_from_slice(&self.content[..insert_pos]);
            new_content.extend(tokens.iter().cloned());
            new_content.extend_from_slice(&self.content[insert_pos..]);
            self.content = new_content;
        }

        for cursor in &mut self.cursors {
            if cursor.location >= loc {
                cursor.location += inserted_len;
            }
        }
    }

    /// Removes `token`'s byte range from every overlapping content token
    /// (same arena + overlapping range). Cursors inside the removed range
    /// collapse to its (shifted) start; cursors after it shift left.
    pub fn remove(&mut self, removed: &Token) {
        let removed_span = removed.span();
        let removed_arena_ptr = removed.arena().map(arena_ptr);

        let mut new_content = Vec::with_capacity(self.content.len());
        let mut cuts: Vec<(usize, usize)> = Vec::new();
        let mut old_logical = 0usize;

        for tok in &self.content {
            let tok_len = tok.len();
            let same_arena = match (&removed_arena_ptr, tok.arena()) {
                (Some(p), Some(a)) => *p == arena_ptr(a),
                _ => false,
            };
            if same_arena {
                let lo = tok.start.max(removed_span.start);
                let hi = tok.end.min(removed_span.end);
                if lo < hi {
                    let rel_lo = lo - tok.start;
                    let rel_hi = hi - tok.start;
                    cuts.push((old_logical + rel_lo, old_logical + rel_hi));
                    if tok.start < lo {
                        new_content.push(tok.slice(0, rel_lo));
                    }
                    if hi < tok.end {
                        new_content.push(tok.slice(rel_hi, tok.end - tok.start));
                    }
                    old_logical += tok_len;
                    continue;
                }
            }
            new_content.push(tok.clone());
            old_logical += tok_len;
        }
        self.content = new_content;

        for cursor in &mut self.cursors {
            let mut removed_before = 0usize;
            let mut clamp_to = None;
            for &(cs, ce) in &cuts {
                if cursor.location >= ce {
                    removed_before += ce - cs;
                } else if cursor.location >= cs {
                    clamp_to = Some(cs - removed_before);
                    break;
                } else {
                    break;
                }
            }
            cursor.location = clamp_to.unwrap_or(cursor.location - removed_before);
        }
    }

    /// Walks content tokens in order and copies their bytes to `w`,
    /// coalescing adjacent ranges from the same arena into one call.
    pub fn write_to<W: std::io::Write>(&self, w: &mut W) -> Result<(), WriteToError> {
        let mut i = 0;
        while i < self.content.len() {
            let first = &self.content[i];
            let mut j = i + 1;
            let mut end = first.end;
            while j < self.content.len() {
                let next = &self.content[j];
                let same_arena = match (first.arena(), next.arena()) {
                    (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                    _ => false,
                };
                if same_arena && next.start == end {
                    end = next.end;
                    j += 1;
                } else {
                    break;
                }
            }
            if let Some(arena) = first.arena() {
                let bytes = arena.bytes(first.start, end)?;
                w.write_all(&bytes)?;
            }
            i = j;
        }
        Ok(())
    }

    /// Materializes the full content as an owned byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WriteToError> {
        let mut out = Vec::with_capacity(self.total_len());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

fn arena_ptr(a: &Arc<dyn ArenaBacking>) -> *const () {
    Arc::as_ptr(a) as *const ()
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_write_to_roundtrips() {
        let mut ed = Editor::new();
        ed.write(b"hello ");
        ed.write(b"world");
        assert_eq!(ed.to_bytes().unwrap(), b"hello world");
    }

    #[test]
    fn insert_at_cursor_splits_token() {
        let mut ed = Editor::new();
        ed.write(b"hello world");
        let id = ed.cursor_at(6);
        ed.write_at(id, b"brave new ");
        assert_eq!(ed.to_bytes().unwrap(), b"hello brave new world");
    }

    #[test]
    fn cursor_after_insertion_point_shifts() {
        let mut ed = Editor::new();
        ed.write(b"hello world");
        let end = ed.cursor_at(11);
        let insert_id = ed.cursor_at(6);
        ed.write_at(insert_id, b"brave new ");
        assert_eq!(ed.location(end), 11 + "brave new ".len());
    }

    #[test]
    fn cursor_before_insertion_point_unaffected() {
        let mut ed = Editor::new();
        ed.write(b"hello world");
        let start = ed.cursor_at(0);
        let insert_id = ed.cursor_at(6);
        ed.write_at(insert_id, b"brave new ");
        assert_eq!(ed.location(start), 0);
    }

    #[test]
    fn remove_token_drops_its_bytes() {
        let mut ed = Editor::new();
        let tok = ed.write(b"hello world");
        let removed = tok.slice(5, 11); // " world"
        ed.remove(&removed);
        assert_eq!(ed.to_bytes().unwrap(), b"hello");
    }

    #[test]
    fn remove_shifts_trailing_cursor_left() {
        let mut ed = Editor::new();
        let tok = ed.write(b"hello world");
        let after = ed.cursor_at(11);
        let removed = tok.slice(5, 11);
        ed.remove(&removed);
        assert_eq!(ed.location(after), 5);
    }
}
