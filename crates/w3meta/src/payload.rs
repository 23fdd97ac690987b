//! Payload parser: turns a reconstructed payload string into typed match
//! records.
//!
//! The payload is line-oriented:
//!
//! ```text
//! v3
//! mapName:Island Troll Tribes
//! matchId:a1b2c3
//! ...
//! player:0|Alice|troll|hunter|1|WIN|1234|0|56|300|12|4|0|1|2|0|0
//! player:1|Bob|troll|mage|2|LOSS|...
//! checksum:482913
//! END
//! ```
//!
//! Everything before the `checksum:` line (header included) is the checksum
//! input. Schema v3 inserted a class field into player lines after the race
//! field; v2 lines are still accepted. Per-player stat blocks are optional —
//! a player who disconnected before the stat flush transmits only the core
//! fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::checksum::verify_checksum;
use crate::{MetadataSpec, MetaError};

const PLAYER_PREFIX: &str = "player:";
const CHECKSUM_PREFIX: &str = "checksum:";
const END_MARKER: &str = "END";

const REQUIRED_KEYS: [&str; 7] = [
    "mapName",
    "mapVersion",
    "matchId",
    "duration",
    "startTime",
    "endTime",
    "playerCount",
];

/// Options for [`parse_payload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip checksum verification. Diagnostic tooling uses this, and the
    /// MMD channel decodes with it on: channel escaping can perturb the
    /// checksum input without corrupting the fields themselves.
    pub skip_checksum: bool,
}

/// Normalized match result transmitted per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    /// Left before the match ended; scored as a loss by the site.
    Leave,
    Draw,
    /// A result string this build does not recognize, preserved verbatim.
    Unknown(String),
}

impl MatchResult {
    fn from_str(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "WIN" => MatchResult::Win,
            "LOSS" => MatchResult::Loss,
            "LEAVE" => MatchResult::Leave,
            "DRAW" => MatchResult::Draw,
            _ => MatchResult::Unknown(raw.to_string()),
        }
    }
}

/// Animal kill counters from the per-player stat block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalKills {
    pub elk: u32,
    pub hawk: u32,
    pub snake: u32,
    pub wolf: u32,
    pub bear: u32,
    pub panther: u32,
}

/// Optional per-player gameplay statistics (schema v2+).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub damage_troll: u32,
    pub self_healing: u32,
    pub ally_healing: u32,
    pub gold_acquired: u32,
    pub meat_eaten: u32,
    pub kills: AnimalKills,
}

/// One player record from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub slot_index: u32,
    pub name: String,
    pub race: String,
    /// Troll class; absent on schema v2 payloads.
    pub class: Option<String>,
    pub team: u32,
    /// Raw result string as transmitted.
    pub result: String,
    pub stats: Option<PlayerStats>,
}

impl PlayerMetadata {
    /// The transmitted result, normalized.
    pub fn match_result(&self) -> MatchResult {
        MatchResult::from_str(&self.result)
    }
}

/// The fully validated match record — the only artifact this pipeline
/// exposes to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub schema_version: u32,
    pub map_name: String,
    pub map_version: String,
    pub match_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_seconds: i64,
    pub player_count: usize,
    pub players: Vec<PlayerMetadata>,
    pub checksum: u32,
    /// Keys the schema does not know, preserved in payload order.
    pub extras: IndexMap<String, String>,
}

fn malformed(msg: impl Into<String>) -> MetaError {
    MetaError::MalformedPayload(msg.into())
}

fn parse_schema_version(line: &str) -> Result<u32, MetaError> {
    let rest = line
        .strip_prefix('v')
        .ok_or_else(|| malformed("missing schema version header"))?;
    rest.parse()
        .map_err(|_| malformed(format!("invalid schema version header {line:?}")))
}

fn coerce_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, MetaError> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(format!("invalid numeric value {value:?} for {key}")))
}

fn stat(parts: &[&str], index: usize) -> u32 {
    parts
        .get(index)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn parse_player_line(line: &str, schema_version: u32) -> Result<PlayerMetadata, MetaError> {
    let parts: Vec<&str> = line[PLAYER_PREFIX.len()..].split('|').collect();
    if parts.len() < 5 {
        return Err(malformed(format!("invalid player line: {line}")));
    }

    // v3+ inserted a class field: slot|name|race|class|team|result|<stats>
    // v2:                         slot|name|race|team|result|<stats>
    let has_class = schema_version >= 3;
    let (class, team_idx) = if has_class {
        (Some(parts[3].to_string()), 4)
    } else {
        (None, 3)
    };
    if parts.len() < team_idx + 2 {
        return Err(malformed(format!("invalid player line: {line}")));
    }

    let slot_index = coerce_number(parts[0], "slot")?;
    let team = coerce_number(parts[team_idx], "team")?;
    let result = parts[team_idx + 1].to_string();

    // Stat block: 11 numeric fields after the result, only trusted when the
    // line carries the full complement.
    let stats_offset = team_idx + 2;
    let min_fields_for_stats = stats_offset + 11;
    let stats = (parts.len() >= min_fields_for_stats).then(|| PlayerStats {
        damage_troll: stat(&parts, stats_offset),
        self_healing: stat(&parts, stats_offset + 1),
        ally_healing: stat(&parts, stats_offset + 2),
        gold_acquired: stat(&parts, stats_offset + 3),
        meat_eaten: stat(&parts, stats_offset + 4),
        kills: AnimalKills {
            elk: stat(&parts, stats_offset + 5),
            hawk: stat(&parts, stats_offset + 6),
            snake: stat(&parts, stats_offset + 7),
            wolf: stat(&parts, stats_offset + 8),
            bear: stat(&parts, stats_offset + 9),
            panther: stat(&parts, stats_offset + 10),
        },
    });

    Ok(PlayerMetadata {
        slot_index,
        name: parts[1].to_string(),
        race: parts[2].to_string(),
        class,
        team,
        result,
        stats,
    })
}

/// Parses a reconstructed payload into a validated [`MatchMetadata`].
///
/// Structural problems (missing header, missing `checksum:` line, missing
/// `END`, bad player lines, missing required keys, player-count mismatch)
/// fail with [`MetaError::MalformedPayload`]; a structurally sound payload
/// whose declared checksum disagrees with its content fails with
/// [`MetaError::ChecksumMismatch`]. The two are never conflated — a caller
/// that sees either must report "no metadata recovered" rather than trust
/// partial values.
pub fn parse_payload(
    payload: &str,
    spec: &MetadataSpec,
    options: &ParseOptions,
) -> Result<MatchMetadata, MetaError> {
    let normalized = payload.replace("\r\n", "\n");
    let mut lines = normalized.split('\n');

    let header = lines.next().unwrap_or("");
    let schema_version = parse_schema_version(header)?;

    let mut before_checksum = vec![header];
    let mut players = Vec::new();
    let mut key_values: IndexMap<String, String> = IndexMap::new();
    let mut checksum: Option<u32> = None;
    let mut end_seen = false;

    for line in lines {
        if let Some(raw) = line.strip_prefix(CHECKSUM_PREFIX) {
            checksum = Some(coerce_number(raw, "checksum")?);
            continue;
        }
        if checksum.is_none() {
            before_checksum.push(line);
        }
        if line.is_empty() {
            continue;
        }
        if line == END_MARKER {
            end_seen = true;
            continue;
        }
        if line.starts_with(PLAYER_PREFIX) {
            players.push(parse_player_line(line, schema_version)?);
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(malformed(format!("invalid key/value line: {line}")));
        };
        if key.is_empty() {
            return Err(malformed(format!("invalid key/value line: {line}")));
        }
        key_values.insert(key.to_string(), value.to_string());
    }

    let checksum = checksum.ok_or_else(|| malformed("payload missing checksum line"))?;
    if !end_seen {
        return Err(malformed("payload missing END terminator"));
    }

    if !options.skip_checksum {
        verify_checksum(&before_checksum.join("\n"), checksum, spec)?;
    }

    let require = |key: &str| -> Result<&str, MetaError> {
        key_values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| malformed(format!("missing field {key}")))
    };

    let map_name = require("mapName")?.to_string();
    let map_version = require("mapVersion")?.to_string();
    let match_id = require("matchId")?.to_string();
    let duration_seconds = coerce_number(require("duration")?, "duration")?;
    let start_time = coerce_number(require("startTime")?, "startTime")?;
    let end_time = coerce_number(require("endTime")?, "endTime")?;
    let player_count: usize = coerce_number(require("playerCount")?, "playerCount")?;

    if player_count != players.len() {
        return Err(malformed(format!(
            "player count mismatch: payload declares {player_count}, found {}",
            players.len()
        )));
    }

    let extras = key_values
        .into_iter()
        .filter(|(k, _)| !REQUIRED_KEYS.contains(&k.as_str()))
        .collect();

    Ok(MatchMetadata {
        schema_version,
        map_name,
        map_version,
        match_id,
        start_time,
        end_time,
        duration_seconds,
        player_count,
        players,
        checksum,
        extras,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::compute_checksum;

    fn spec() -> MetadataSpec {
        MetadataSpec::current()
    }

    /// Builds a payload with a correct checksum line inserted before END.
    fn seal(body: &str, spec: &MetadataSpec) -> String {
        let sum = compute_checksum(body, spec.checksum_modulo);
        format!("{body}\nchecksum:{sum}\nEND")
    }

    fn v3_body() -> String {
        [
            "v3",
            "mapName:Island Troll Tribes",
            "mapVersion:1.2.9",
            "matchId:m-7731",
            "duration:1843",
            "startTime:1733356920",
            "endTime:1733358763",
            "playerCount:2",
            "player:0|Alice|troll|hunter|1|WIN|1234|50|56|300|12|4|0|1|2|0|0",
            "player:3|Bob|troll|mage|2|LOSS|310|8|0|120|7|1|1|0|0|0|0",
        ]
        .join("\n")
    }

    #[test]
    fn parses_a_sealed_v3_payload() {
        let spec = spec();
        let meta = parse_payload(&seal(&v3_body(), &spec), &spec, &ParseOptions::default()).unwrap();

        assert_eq!(meta.schema_version, 3);
        assert_eq!(meta.map_name, "Island Troll Tribes");
        assert_eq!(meta.match_id, "m-7731");
        assert_eq!(meta.duration_seconds, 1843);
        assert_eq!(meta.player_count, 2);
        assert_eq!(meta.players.len(), 2);

        let alice = &meta.players[0];
        assert_eq!(alice.slot_index, 0);
        assert_eq!(alice.class.as_deref(), Some("hunter"));
        assert_eq!(alice.team, 1);
        assert_eq!(alice.match_result(), MatchResult::Win);
        let stats = alice.stats.unwrap();
        assert_eq!(stats.damage_troll, 1234);
        assert_eq!(stats.kills.snake, 1);
        assert_eq!(stats.kills.wolf, 2);

        assert_eq!(meta.players[1].match_result(), MatchResult::Loss);
        assert!(meta.extras.is_empty());
    }

    #[test]
    fn v2_player_lines_have_no_class_field() {
        let spec = spec();
        let body = [
            "v2",
            "mapName:Island Troll Tribes",
            "mapVersion:1.1.0",
            "matchId:m-11",
            "duration:600",
            "startTime:100",
            "endTime:700",
            "playerCount:1",
            "player:2|Cara|troll|1|DRAW|10|0|0|5|1|0|0|0|0|0|0",
        ]
        .join("\n");
        let meta = parse_payload(&seal(&body, &spec), &spec, &ParseOptions::default()).unwrap();
        let cara = &meta.players[0];
        assert_eq!(cara.class, None);
        assert_eq!(cara.team, 1);
        assert_eq!(cara.match_result(), MatchResult::Draw);
        assert_eq!(cara.stats.unwrap().damage_troll, 10);
    }

    #[test]
    fn short_player_line_parses_without_stats() {
        let spec = spec();
        let body = [
            "v3",
            "mapName:Island Troll Tribes",
            "mapVersion:1.2.9",
            "matchId:m-1",
            "duration:60",
            "startTime:0",
            "endTime:60",
            "playerCount:1",
            "player:0|Dana|troll|thief|2|LEAVE",
        ]
        .join("\n");
        let meta = parse_payload(&seal(&body, &spec), &spec, &ParseOptions::default()).unwrap();
        let dana = &meta.players[0];
        assert!(dana.stats.is_none());
        assert_eq!(dana.match_result(), MatchResult::Leave);
    }

    #[test]
    fn unknown_result_strings_are_preserved() {
        assert_eq!(
            MatchResult::from_str("FORFEIT"),
            MatchResult::Unknown("FORFEIT".to_string())
        );
        assert_eq!(MatchResult::from_str("win"), MatchResult::Win);
    }

    #[test]
    fn unknown_keys_land_in_extras_in_order() {
        let spec = spec();
        let body = [
            "v3",
            "mapName:Island Troll Tribes",
            "mapVersion:1.2.9",
            "matchId:m-2",
            "gameMode:elimination",
            "duration:60",
            "startTime:0",
            "endTime:60",
            "host:ent-eu",
            "playerCount:0",
        ]
        .join("\n");
        let meta = parse_payload(&seal(&body, &spec), &spec, &ParseOptions::default()).unwrap();
        let extras: Vec<(&str, &str)> = meta
            .extras
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(extras, vec![("gameMode", "elimination"), ("host", "ent-eu")]);
    }

    #[test]
    fn checksum_mismatch_is_distinct_from_malformed() {
        let spec = spec();
        let body = v3_body();
        let sum = compute_checksum(&body, spec.checksum_modulo);
        let bad = format!("{body}\nchecksum:{}\nEND", sum.wrapping_add(1));
        let err = parse_payload(&bad, &spec, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, MetaError::ChecksumMismatch { .. }));
    }

    #[test]
    fn skip_checksum_accepts_a_mismatched_sum() {
        let spec = spec();
        let bad = format!("{}\nchecksum:1\nEND", v3_body());
        let meta = parse_payload(&bad, &spec, &ParseOptions { skip_checksum: true }).unwrap();
        assert_eq!(meta.checksum, 1);
    }

    #[test]
    fn missing_header_checksum_or_end_is_malformed() {
        let spec = spec();
        let cases = vec![
            "mapName:x\nchecksum:0\nEND".to_string(), // no v<N> header
            format!("{}\nEND", v3_body()),            // no checksum line
            seal(&v3_body(), &spec).replace("\nEND", ""), // no END
        ];
        for payload in &cases {
            let err = parse_payload(payload, &spec, &ParseOptions { skip_checksum: true })
                .unwrap_err();
            assert!(matches!(err, MetaError::MalformedPayload(_)), "{payload:?}");
        }
    }

    #[test]
    fn player_count_mismatch_is_malformed() {
        let spec = spec();
        let body = v3_body().replace("playerCount:2", "playerCount:3");
        let err =
            parse_payload(&seal(&body, &spec), &spec, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, MetaError::MalformedPayload(_)));
    }

    #[test]
    fn crlf_payloads_normalize() {
        let spec = spec();
        let sealed = seal(&v3_body(), &spec).replace('\n', "\r\n");
        let meta = parse_payload(&sealed, &spec, &ParseOptions::default()).unwrap();
        assert_eq!(meta.player_count, 2);
    }

    #[test]
    fn keyless_line_is_malformed() {
        let spec = spec();
        let err = parse_payload(
            "v3\njusttext\nchecksum:0\nEND",
            &spec,
            &ParseOptions { skip_checksum: true },
        )
        .unwrap_err();
        assert!(matches!(err, MetaError::MalformedPayload(_)));
    }
}
