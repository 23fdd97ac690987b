//! Order-stream reader: flattens the replay's command stream into
//! time-stamped order events.

use log::warn;
use w3meta_blocks::{BlockSink, ParseError, ReplayParser, TimeslotBlock};

use crate::order::order_string;

/// One order issuance, as observed in the command stream.
///
/// Ephemeral: produced per command action and consumed once by the
/// extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    /// Canonical hex form of the order identifier.
    pub order_id: String,
    /// Player whose command block carried the action.
    pub player_id: u8,
    /// Milliseconds since replay start, monotonic across timeslots.
    pub timestamp_ms: u64,
}

/// Sink that accumulates order events while tracking game-clock elapsed
/// time across timeslot blocks.
#[derive(Debug, Default)]
struct OrderCollector {
    elapsed_ms: u64,
    events: Vec<OrderEvent>,
}

impl BlockSink for OrderCollector {
    fn timeslot(&mut self, block: &TimeslotBlock) {
        self.elapsed_ms += u64::from(block.time_increment_ms);
        for command in &block.commands {
            for action in &command.actions {
                let Some(bytes) = action.order_bytes() else {
                    continue;
                };
                if let Some(order_id) = order_string(bytes) {
                    self.events.push(OrderEvent {
                        order_id,
                        player_id: command.player_id,
                        timestamp_ms: self.elapsed_ms,
                    });
                }
            }
        }
    }
}

/// Reads the full order-event stream out of a replay.
///
/// Events follow block-then-action enumeration order within each timeslot;
/// no global sort is applied (the extractor sorts). A container parse
/// failure is returned alongside whatever was captured before it — a
/// truncated replay still yields the burst if the burst came first.
pub fn read_order_stream(
    parser: &mut dyn ReplayParser,
    bytes: &[u8],
) -> (Vec<OrderEvent>, Option<ParseError>) {
    let mut collector = OrderCollector::default();
    let failure = match parser.parse(bytes, &mut collector) {
        Ok(()) => None,
        Err(err) => {
            warn!(
                "container parse failed after {} events, continuing with partial data: {err}",
                collector.events.len()
            );
            Some(err)
        }
    };
    (collector.events, failure)
}
