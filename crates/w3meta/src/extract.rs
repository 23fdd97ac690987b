//! Metadata stream extractor: finds the encoder burst among all order
//! events.
//!
//! There is no framing marker around the transmission. The discriminator is
//! temporal: the encoder issues its orders at a fixed short interval in one
//! tight burst at end of match, while genuine player input reusing the same
//! order identifiers is sparse, or dense only briefly. Gap-based clustering
//! followed by "longest run wins" is therefore robust against gameplay
//! false positives, at the cost of being best-effort rather than exact.

use std::collections::HashSet;

use crate::{MetadataSpec, MetaError, OrderEvent};

/// Default maximum gap between consecutive burst events.
pub const DEFAULT_GAP_MS: u64 = 200;

/// Tunables for run segmentation.
///
/// The gap threshold tracks the encoder's emission interval in the map
/// script; if a future map build slows the encoder down, widen it here
/// rather than re-deriving the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Events further apart than this start a new run.
    pub gap_ms: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            gap_ms: DEFAULT_GAP_MS,
        }
    }
}

/// Recovers the metadata transmission's order identifiers, in chronological
/// order.
///
/// Filters `events` to alphabet membership, stable-sorts by timestamp,
/// partitions greedily at gaps wider than `config.gap_ms`, and keeps the
/// first run of maximal length (deterministic tie-break). Fails with
/// [`MetaError::StreamNotFound`] — carrying the scanned event count — when
/// nothing matches the alphabet.
pub fn extract_metadata_order_ids(
    events: &[OrderEvent],
    spec: &MetadataSpec,
    config: &ExtractConfig,
) -> Result<Vec<String>, MetaError> {
    let alphabet: HashSet<&str> = spec.symbol_order_strings.iter().map(String::as_str).collect();

    let mut matched: Vec<&OrderEvent> = events
        .iter()
        .filter(|e| alphabet.contains(e.order_id.as_str()))
        .collect();

    if matched.is_empty() {
        return Err(MetaError::StreamNotFound {
            total_events: events.len(),
        });
    }

    // Stable: equal timestamps keep their command-stream relative order.
    matched.sort_by_key(|e| e.timestamp_ms);

    let mut best: (usize, usize) = (0, 0); // (start, len)
    let mut run_start = 0usize;
    for i in 1..=matched.len() {
        let run_ended = i == matched.len()
            || matched[i].timestamp_ms - matched[i - 1].timestamp_ms > config.gap_ms;
        if run_ended {
            let len = i - run_start;
            if len > best.1 {
                best = (run_start, len);
            }
            run_start = i;
        }
    }

    Ok(matched[best.0..best.0 + best.1]
        .iter()
        .map(|e| e.order_id.clone())
        .collect())
}
