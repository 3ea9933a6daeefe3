//! Core engine for a plain-text, append-mostly stream-of-consciousness log:
//! a byte arena with windowed file backing, a CommonMark-flavoured block
//! scanner, variable-granularity dates, an outline path over the block
//! stream, and the present-day rollover engine that ties them together.

pub mod arena;
pub mod block;
pub mod outline;
pub mod present;
pub mod time;

pub use arena::{Area, ArenaBacking, ArenaError, ByteArena, CursorId, Editor, FileArena, Span, Token, WriteToError};
pub use block::{Block, BlockType, ScanEvent, TokenizeError, Tokenizer};
pub use outline::{OutlineError, OutlineScanner, TitledBlock};
pub use present::{default_items, Item, PresentEngine, PresentError, RolloverOutcome, Section, Store};
pub use time::{GrainedTime, Grain};
