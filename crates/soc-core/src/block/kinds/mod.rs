//! Block-specific marker recognition, one module per kind, each owning its
//! own delimiter constants (mirrors the teacher's "knowledge ownership"
//! principle: classifier code calls these helpers, never hardcodes
//! delimiters).

pub mod blockquote;
pub mod codefence;
pub mod heading;
pub mod indent;
pub mod list_item;
pub mod ruler;

pub use blockquote::BlockQuote;
pub use codefence::CodeFence;
pub use heading::Heading;
pub use list_item::ListItem;
pub use ruler::Ruler;
