//! Replay container parse error.

use thiserror::Error;

/// Error raised by a [`crate::ReplayParser`] implementation.
///
/// Blocks delivered to the sink before the error surfaced remain valid;
/// consumers are expected to keep them and continue with partial data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer ended inside a block.
    #[error("truncated replay: unexpected end of buffer at offset {0}")]
    Truncated(usize),
    /// A block header declared an id the parser does not know.
    #[error("unknown block id 0x{0:02x} at offset {1}")]
    UnknownBlock(u8, usize),
    /// The buffer is not a replay at all (bad magic, zero length).
    #[error("not a replay: {0}")]
    NotAReplay(&'static str),
    /// Catch-all for container-library failures that do not map onto the
    /// variants above.
    #[error("replay parser failure: {0}")]
    Other(String),
}
