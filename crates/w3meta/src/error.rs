//! Pipeline error type.

use thiserror::Error;
use w3meta_blocks::ParseError;

/// Errors surfaced by the metadata pipeline.
///
/// The variants mirror how callers are expected to react:
/// [`MetaError::StreamNotFound`] means "this replay carries no metadata on
/// that channel" and callers fall through to the next channel;
/// [`MetaError::ChecksumMismatch`] and [`MetaError::MalformedPayload`] mean
/// the data is there but cannot be trusted, and must never be silently
/// downgraded to a success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetaError {
    /// The replay bytes could not be loaded at all.
    #[error("replay unreadable: {0}")]
    Io(String),

    /// The container parser failed unrecoverably before any usable block
    /// was delivered.
    #[error("replay parse failed: {0}")]
    Parse(#[from] ParseError),

    /// No event or message on the channel matched the metadata encoding.
    #[error("no metadata stream found ({total_events} events scanned)")]
    StreamNotFound { total_events: usize },

    /// The payload declared a checksum that does not match its content.
    #[error("payload checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch { declared: u32, computed: u32 },

    /// The payload is structurally invalid before a checksum could even be
    /// computed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The decode table failed its construction invariants.
    #[error("invalid metadata spec: {0}")]
    SpecInvalid(String),

    /// A selected order-channel symbol has no alphabet entry. Only possible
    /// when a caller-supplied spec's membership set and translation table
    /// diverge — the built-in registry cannot produce this.
    #[error("order id {order_id} matched the alphabet but has no symbol")]
    UnknownSymbol { order_id: String },
}
