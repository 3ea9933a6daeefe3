use std::sync::Arc;

use super::error::ArenaError;
use super::span::Span;

/// Shared behaviour of a byte arena: something that can hand back the bytes
/// referenced by a `[start, end)` range, and report its total size.
///
/// Implementations serialize window moves internally (see [`super::file_arena::FileArena`]),
/// so an `Arc<dyn ArenaBacking>` may be handed to many tokens and cloned freely.
pub trait ArenaBacking: std::fmt::Debug + Send + Sync {
    /// Total size of the virtual byte space this arena exposes.
    fn size(&self) -> usize;

    /// Load the bytes for `[start, end)`, clipped to `[0, size()]`.
    fn bytes(&self, start: usize, end: usize) -> Result<Vec<u8>, ArenaError>;
}

/// A handle into an arena: a value type carrying `(arena, start, end)`.
///
/// Tokens are cheap to clone (an `Arc` bump) and carry no bytes themselves;
/// bytes are fetched lazily from the arena on demand.
#[derive(Clone)]
pub struct Token {
    arena: Option<Arc<dyn ArenaBacking>>,
    pub start: usize,
    pub end: usize,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("has_arena", &self.arena.is_some())
            .finish()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && match (&self.arena, &other.arena) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Token {
    /// The zero-valued (empty, arena-less) token.
    pub fn empty() -> Self {
        Token {
            arena: None,
            start: 0,
            end: 0,
        }
    }

    pub fn new(arena: Arc<dyn ArenaBacking>, start: usize, end: usize) -> Self {
        if start >= end {
            return Token {
                arena: Some(arena),
                start,
                end: start,
            };
        }
        Token { arena: Some(arena), start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_none() || self.start == self.end
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn arena(&self) -> Option<&Arc<dyn ArenaBacking>> {
        self.arena.as_ref()
    }

    /// Fetches the referenced bytes from the arena.
    pub fn bytes(&self) -> Result<Vec<u8>, ArenaError> {
        match &self.arena {
            None => {
                if self.start == self.end {
                    Ok(Vec::new())
                } else {
                    Err(ArenaError::NoArena)
                }
            }
            Some(a) => a.bytes(self.start, self.end),
        }
    }

    /// Returns a sub-token `[i, j)` relative to this token's start.
    pub fn slice(&self, i: usize, j: usize) -> Token {
        let lo = (self.start + i).min(self.end);
        let hi = (self.start + j).min(self.end);
        Token {
            arena: self.arena.clone(),
            start: lo,
            end: hi.max(lo),
        }
    }

    /// Splits this token at absolute offset `at`, returning `(head, tail)`.
    /// `at` is clamped into `[start, end]`.
    pub fn split_at(&self, at: usize) -> (Token, Token) {
        let at = at.clamp(self.start, self.end);
        (
            Token {
                arena: self.arena.clone(),
                start: self.start,
                end: at,
            },
            Token {
                arena: self.arena.clone(),
                start: at,
                end: self.end,
            },
        )
    }

    /// Finds the first occurrence of `byte` within the token's bytes,
    /// returning an absolute offset.
    pub fn index_byte(&self, byte: u8) -> Result<Option<usize>, ArenaError> {
        let bytes = self.bytes()?;
        Ok(bytes.iter().position(|b| *b == byte).map(|i| self.start + i))
    }

    /// Finds the first occurrence of `needle` within the token's bytes,
    /// returning an absolute offset.
    pub fn index(&self, needle: &[u8]) -> Result<Option<usize>, ArenaError> {
        if needle.is_empty() {
            return Ok(Some(self.start));
        }
        let bytes = self.bytes()?;
        Ok(bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| self.start + i))
    }
}
