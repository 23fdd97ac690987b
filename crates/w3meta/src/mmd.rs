//! MMD channel reader: recovers the payload from `custom itt_*` map-data
//! entries.
//!
//! The map script writes its payload into the replay's native map-data
//! side channel as `custom <identifier> <data>` entries attached to the
//! encoder unit. Three control identifiers describe the transmission
//! (`itt_version`, `itt_schema`, `itt_chunks`) and the payload itself is
//! split across `itt_data_0 .. itt_data_{n-1}`. Delivery order is not
//! guaranteed to match logical order, so reconstruction goes by chunk
//! index, never by arrival.

use indexmap::IndexMap;
use log::warn;
use w3meta_blocks::{Action, BlockSink, ParseError, ReplayParser, TimeslotBlock};

const CUSTOM_PREFIX: &str = "custom ";
const KEY_VERSION: &str = "itt_version";
const KEY_SCHEMA: &str = "itt_schema";
const KEY_CHUNKS: &str = "itt_chunks";
const KEY_DATA_PREFIX: &str = "itt_data_";

/// A reconstructed MMD transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MmdMetadata {
    /// Map-script version string (`itt_version`), when present.
    pub version: Option<String>,
    /// Payload schema version (`itt_schema`), when present and numeric.
    pub schema: Option<u32>,
    /// Number of chunks actually recovered.
    pub chunk_count: usize,
    /// The un-escaped payload.
    pub payload: String,
}

/// Everything the MMD reader saw, kept for diagnostics even when no
/// metadata was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MmdScan {
    /// All `custom` identifier/data pairs, in arrival order. Later entries
    /// for the same identifier overwrite earlier ones.
    pub custom_data: IndexMap<String, String>,
    /// Total map-data entries observed, `custom` or not.
    pub entry_count: usize,
    /// The reconstructed transmission; `None` is the definite "this replay
    /// carries no MMD metadata" signal, not an error.
    pub metadata: Option<MmdMetadata>,
}

#[derive(Default)]
struct MapDataCollector {
    custom_data: IndexMap<String, String>,
    entry_count: usize,
}

impl BlockSink for MapDataCollector {
    fn timeslot(&mut self, block: &TimeslotBlock) {
        for command in &block.commands {
            for action in &command.actions {
                let Action::MapData { key, .. } = action else {
                    continue;
                };
                self.entry_count += 1;
                let Some(content) = key.strip_prefix(CUSTOM_PREFIX) else {
                    continue;
                };
                if let Some((identifier, data)) = content.split_once(' ') {
                    self.custom_data
                        .insert(identifier.to_string(), data.to_string());
                }
            }
        }
    }
}

/// Reverses the map script's escape transform: `\\` back to a literal
/// backslash, `\ ` back to a plain space.
///
/// The double-backslash is substituted through a placeholder first so an
/// escaped backslash can never be re-read as the start of a space escape.
fn unescape(raw: &str) -> String {
    const PLACEHOLDER: &str = "\u{1}";
    raw.replace("\\\\", PLACEHOLDER)
        .replace("\\ ", " ")
        .replace(PLACEHOLDER, "\\")
}

/// Assembles the transmission out of a scanned custom-data map.
///
/// Returns `None` when `itt_chunks` is absent, non-numeric, or non-positive.
/// Missing data chunks are skipped rather than failing the whole
/// reconstruction — a player disconnecting mid-write loses suffix chunks,
/// and a truncated payload is still diagnosable downstream.
fn assemble(custom_data: &IndexMap<String, String>) -> Option<MmdMetadata> {
    let declared: usize = custom_data.get(KEY_CHUNKS)?.parse().ok()?;
    if declared == 0 {
        return None;
    }

    let mut raw = String::new();
    let mut chunk_count = 0usize;
    for i in 0..declared {
        if let Some(chunk) = custom_data.get(&format!("{KEY_DATA_PREFIX}{i}")) {
            raw.push_str(chunk);
            chunk_count += 1;
        }
    }

    Some(MmdMetadata {
        version: custom_data.get(KEY_VERSION).cloned(),
        schema: custom_data.get(KEY_SCHEMA).and_then(|s| s.parse().ok()),
        chunk_count,
        payload: unescape(&raw),
    })
}

/// Scans a replay's map-data entries and reconstructs the MMD transmission.
///
/// Container parse failures are logged and returned alongside whatever was
/// captured first; the scan is never discarded.
pub fn read_mmd(parser: &mut dyn ReplayParser, bytes: &[u8]) -> (MmdScan, Option<ParseError>) {
    let mut collector = MapDataCollector::default();
    let failure = match parser.parse(bytes, &mut collector) {
        Ok(()) => None,
        Err(err) => {
            warn!(
                "container parse failed after {} map-data entries, continuing with partial data: {err}",
                collector.entry_count
            );
            Some(err)
        }
    };
    let metadata = assemble(&collector.custom_data);
    (
        MmdScan {
            custom_data: collector.custom_data,
            entry_count: collector.entry_count,
            metadata,
        },
        failure,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use w3meta_blocks::SyntheticReplay;

    fn scan(replay: SyntheticReplay) -> MmdScan {
        let mut replay = replay;
        let (scan, failure) = read_mmd(&mut replay, &[]);
        assert!(failure.is_none());
        scan
    }

    #[test]
    fn reconstructs_chunks_in_index_order_not_arrival_order() {
        let replay = SyntheticReplay::new()
            .map_data(100, 1, "custom itt_chunks 3")
            .map_data(100, 1, "custom itt_data_1 b")
            .map_data(100, 1, "custom itt_data_0 a")
            .map_data(100, 1, "custom itt_data_2 c");

        let md = scan(replay).metadata.unwrap();
        assert_eq!(md.payload, "abc");
        assert_eq!(md.chunk_count, 3);
    }

    #[test]
    fn unescapes_backslash_and_space() {
        let replay = SyntheticReplay::new()
            .map_data(100, 1, "custom itt_chunks 1")
            .map_data(100, 1, r"custom itt_data_0 a\ b\\c");

        let md = scan(replay).metadata.unwrap();
        assert_eq!(md.payload, r"a b\c");
    }

    #[test]
    fn escaped_backslash_does_not_swallow_a_following_space_escape() {
        assert_eq!(unescape(r"\\\ x"), r"\ x");
        assert_eq!(unescape(r"\\\\"), r"\\");
    }

    #[test]
    fn missing_chunk_count_means_no_metadata() {
        let replay = SyntheticReplay::new().map_data(100, 1, "custom itt_data_0 abc");
        let scan = scan(replay);
        assert!(scan.metadata.is_none());
        assert_eq!(scan.custom_data.len(), 1);
    }

    #[test]
    fn non_numeric_or_zero_chunk_count_means_no_metadata() {
        for value in ["x", "-1", "0", ""] {
            let replay = SyntheticReplay::new()
                .map_data(100, 1, &format!("custom itt_chunks {value}"))
                .map_data(100, 1, "custom itt_data_0 abc");
            assert!(scan(replay).metadata.is_none(), "itt_chunks={value:?}");
        }
    }

    #[test]
    fn missing_middle_chunk_is_skipped() {
        let replay = SyntheticReplay::new()
            .map_data(100, 1, "custom itt_chunks 3")
            .map_data(100, 1, "custom itt_data_0 a")
            .map_data(100, 1, "custom itt_data_2 c");

        let md = scan(replay).metadata.unwrap();
        assert_eq!(md.payload, "ac");
        assert_eq!(md.chunk_count, 2);
    }

    #[test]
    fn carries_version_and_schema_controls() {
        let replay = SyntheticReplay::new()
            .map_data(100, 1, "custom itt_version 1.2.9")
            .map_data(100, 1, "custom itt_schema 3")
            .map_data(100, 1, "custom itt_chunks 1")
            .map_data(100, 1, "custom itt_data_0 v3");

        let md = scan(replay).metadata.unwrap();
        assert_eq!(md.version.as_deref(), Some("1.2.9"));
        assert_eq!(md.schema, Some(3));
    }

    #[test]
    fn non_custom_entries_are_counted_but_ignored() {
        let replay = SyntheticReplay::new()
            .map_data(100, 1, "init version 9 3")
            .map_data(100, 1, "custom itt_chunks 1")
            .map_data(100, 1, "custom itt_data_0 x");

        let scan = scan(replay);
        assert_eq!(scan.entry_count, 3);
        assert_eq!(scan.metadata.unwrap().payload, "x");
    }

    #[test]
    fn keeps_partial_scan_on_parse_failure() {
        let mut replay = SyntheticReplay::new()
            .map_data(100, 1, "custom itt_chunks 1")
            .map_data(100, 1, "custom itt_data_0 x")
            .map_data(100, 1, "custom itt_extra y")
            .fail_after(2, ParseError::Truncated(77));

        let (scan, failure) = read_mmd(&mut replay, &[]);
        assert_eq!(failure, Some(ParseError::Truncated(77)));
        assert_eq!(scan.metadata.unwrap().payload, "x");
    }
}
