//! Recovery of covert match-result metadata from Warcraft III replays.
//!
//! The Island Troll Tribes map has no sanctioned telemetry channel, so the
//! map script smuggles a structured result payload out through the replay
//! itself, three different ways:
//!
//! - as a tight burst of unit orders at end of match, one order identifier
//!   per payload character (the order channel);
//! - as chunked `custom itt_*` key/value entries in the map-data side
//!   channel (the MMD channel);
//! - as chunked `[ITT_META]`-prefixed chat messages (the chat channel).
//!
//! This crate turns a raw replay block stream — produced by any container
//! parser implementing `w3meta_blocks::ReplayParser` — back into a typed,
//! checksum-validated [`MatchMetadata`]. Channel recovery is best-effort by
//! design: the transmission has no framing markers, players disconnect
//! mid-stream, and replays arrive truncated, so every reader prefers
//! partial data over total failure.

pub mod chat;
pub mod checksum;
pub mod decode;
pub mod extract;
pub mod mmd;
pub mod order;
pub mod payload;
pub mod spec;
pub mod stream;

mod error;

pub use decode::{decode_replay, DecodeConfig, DecodeOutcome, MetadataSource};
pub use error::MetaError;
pub use extract::{extract_metadata_order_ids, ExtractConfig};
pub use payload::{parse_payload, MatchMetadata, MatchResult, ParseOptions, PlayerMetadata};
pub use spec::MetadataSpec;
pub use stream::{read_order_stream, OrderEvent};
