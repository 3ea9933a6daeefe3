//! Byte arena, tokens, areas and the editor.
//!
//! Tokens are value types: an `(arena, start, end)` triple. The bytes a
//! token refers to are fetched lazily from its arena; nothing here copies
//! eagerly except on an actual `bytes()` call. A [`ByteArena`] backs
//! newly-written content; a [`FileArena`] backs the on-disk stream file via
//! a sliding window so a large file is never fully resident at once.

pub mod area;
pub mod byte_arena;
pub mod editor;
pub mod error;
pub mod file_arena;
pub mod span;
pub mod token;

pub use area::Area;
pub use byte_arena::ByteArena;
pub use editor::{CursorId, Editor, WriteToError};
pub use error::ArenaError;
pub use file_arena::FileArena;
pub use span::Span;
pub use token::{ArenaBacking, Token};
