/// Errors surfaced by the arena layer (§7: Arena taxonomy).
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// A zero-valued token (`arena == None`) was asked for its bytes.
    #[error("token has no arena")]
    NoArena,

    /// The arena has no backing store to load from (e.g. a bare byte arena
    /// asked to read past what has been written).
    #[error("arena has no backing store for the requested range")]
    NoBacking,

    /// The requested range exceeds the arena's window capacity. The caller
    /// must chunk the read; `prefix` holds the longest valid prefix that
    /// could be served from the current window.
    #[error("requested range exceeds arena window capacity")]
    LargeRead { prefix: Vec<u8> },

    /// The arena has been closed; no further loads are possible.
    #[error("arena is closed")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
