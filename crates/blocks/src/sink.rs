//! Subscription-style interface between a container parser and consumers.

use crate::{ChatBlock, ParseError, TimeslotBlock};

/// Receiver for typed blocks as a parser walks the replay.
///
/// All methods default to no-ops so a consumer subscribes only to the block
/// kinds it cares about.
pub trait BlockSink {
    fn timeslot(&mut self, _block: &TimeslotBlock) {}
    fn chat(&mut self, _block: &ChatBlock) {}
}

/// A replay container parser.
///
/// Implementations walk `bytes` front to back and deliver each decoded
/// block to `sink` before advancing. On error, everything already delivered
/// stays delivered — the caller decides whether partial data is enough.
pub trait ReplayParser {
    fn parse(&mut self, bytes: &[u8], sink: &mut dyn BlockSink) -> Result<(), ParseError>;
}

/// Sink that simply records every block, in delivery order.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    pub timeslots: Vec<TimeslotBlock>,
    pub chats: Vec<ChatBlock>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockSink for CollectSink {
    fn timeslot(&mut self, block: &TimeslotBlock) {
        self.timeslots.push(block.clone());
    }

    fn chat(&mut self, block: &ChatBlock) {
        self.chats.push(block.clone());
    }
}
