//! Chat channel reader: recovers the payload from prefixed chat messages.
//!
//! Older map builds that predate the map-data channel flush the payload
//! through ordinary chat: each message is `[ITT_META]<index>:<data>`.
//! Chunks are reassembled by their embedded index, so network delivery
//! order does not matter.

use std::collections::BTreeMap;

use log::warn;
use w3meta_blocks::{BlockSink, ChatBlock, ParseError, ReplayParser};

const CHAT_PREFIX: &str = "[ITT_META]";

/// Everything the chat reader saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatScan {
    /// Total chat messages in the replay.
    pub total_messages: usize,
    /// How many carried the metadata prefix.
    pub metadata_messages: usize,
    /// Chunks joined in ascending index order; `None` when no prefixed
    /// message exists at all.
    pub payload: Option<String>,
}

#[derive(Default)]
struct ChatCollector {
    total_messages: usize,
    metadata_messages: usize,
    chunks: BTreeMap<usize, String>,
}

impl BlockSink for ChatCollector {
    fn chat(&mut self, block: &ChatBlock) {
        self.total_messages += 1;
        let Some(rest) = block.message.strip_prefix(CHAT_PREFIX) else {
            return;
        };
        self.metadata_messages += 1;
        // `<index>:<data>`; a malformed remainder is dropped, not fatal.
        let Some((index, data)) = rest.split_once(':') else {
            return;
        };
        let Ok(index) = index.parse::<usize>() else {
            return;
        };
        self.chunks.insert(index, data.to_string());
    }
}

/// Scans a replay's chat blocks and reassembles the metadata payload.
///
/// Same fault-tolerance contract as the other readers: a parse failure is
/// logged and returned next to the partial scan.
pub fn read_chat(parser: &mut dyn ReplayParser, bytes: &[u8]) -> (ChatScan, Option<ParseError>) {
    let mut collector = ChatCollector::default();
    let failure = match parser.parse(bytes, &mut collector) {
        Ok(()) => None,
        Err(err) => {
            warn!(
                "container parse failed after {} chat messages, continuing with partial data: {err}",
                collector.total_messages
            );
            Some(err)
        }
    };
    let payload = if collector.metadata_messages == 0 {
        None
    } else {
        // BTreeMap iteration is ascending by index.
        Some(collector.chunks.into_values().collect())
    };
    (
        ChatScan {
            total_messages: collector.total_messages,
            metadata_messages: collector.metadata_messages,
            payload,
        },
        failure,
    )
}
