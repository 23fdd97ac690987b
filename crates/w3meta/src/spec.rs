//! The versioned decode table (spec registry).
//!
//! The map script emits one unit order per payload character, drawn from a
//! fixed ability kit on a designated encoder unit. This registry is the
//! replay-side mirror of that kit: an ordered alphabet of characters and,
//! index-aligned, the canonical order-identifier string each character was
//! transmitted as. The table is derived from the numeric identifier
//! constants through [`crate::order::order_id_to_string`] — the same
//! transform the stream reader applies to incoming bytes — so both sides of
//! the channel are generated by one function.
//!
//! The registry is immutable once built and cheap to share; pipelines that
//! track a diverging map build can load a replacement table from JSON with
//! [`MetadataSpec::from_json`].

use serde::{Deserialize, Serialize};

use crate::order::order_id_to_string;
use crate::MetaError;

/// Ordered alphabet of the reference encoder: 69 symbols, each bound 1:1 to
/// an order identifier in the encoder unit's ability kit.
const ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 |:\n.-_";

/// First order identifier of the encoder kit; symbol `i` maps to
/// `SYMBOL_ORDER_BASE + i`. Sits in the engine's ability-order id range.
const SYMBOL_ORDER_BASE: u32 = 0x000d_1f40;

/// Registry version the reference map build transmits.
const CURRENT_VERSION: u32 = 3;

/// Modulus of the map script's integer-safe checksum accumulator.
const CHECKSUM_MODULO: u32 = 999_983;

/// Rawcode of the designated encoder unit.
const ENCODER_UNIT_ID: &str = "nMDC";

/// The versioned decode table shared read-only by all decode operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSpec {
    /// Spec version; must match the map build that produced the replay.
    pub version: u32,
    /// Rawcode of the unit whose orders and map-data entries carry the
    /// transmission.
    pub encoder_unit_id: String,
    /// Modulus for payload checksum validation.
    pub checksum_modulo: u32,
    /// Output characters, in symbol order.
    pub encode_chars: Vec<char>,
    /// Canonical order-id strings, index-aligned with `encode_chars`.
    pub symbol_order_strings: Vec<String>,
}

impl MetadataSpec {
    /// The built-in registry for the current map build.
    ///
    /// Both columns of the table are produced by a single pass over the
    /// alphabet, so the positional-alignment invariant holds by
    /// construction.
    pub fn current() -> Self {
        let encode_chars: Vec<char> = ALPHABET.chars().collect();
        let symbol_order_strings = (0..encode_chars.len() as u32)
            .map(|i| order_id_to_string(SYMBOL_ORDER_BASE + i))
            .collect();
        Self {
            version: CURRENT_VERSION,
            encoder_unit_id: ENCODER_UNIT_ID.to_string(),
            checksum_modulo: CHECKSUM_MODULO,
            encode_chars,
            symbol_order_strings,
        }
    }

    /// Loads a registry from a JSON document mirroring the map constants,
    /// validating the same invariants the built-in table satisfies.
    pub fn from_json(json: &str) -> Result<Self, MetaError> {
        let spec: MetadataSpec = serde_json::from_str(json)
            .map_err(|e| MetaError::SpecInvalid(format!("bad spec JSON: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the table invariants: non-empty, columns of equal length,
    /// no duplicate symbols, no duplicate or non-canonical order strings.
    pub fn validate(&self) -> Result<(), MetaError> {
        if self.encode_chars.is_empty() {
            return Err(MetaError::SpecInvalid("empty alphabet".into()));
        }
        if self.encode_chars.len() != self.symbol_order_strings.len() {
            return Err(MetaError::SpecInvalid(format!(
                "alphabet has {} chars but {} order strings",
                self.encode_chars.len(),
                self.symbol_order_strings.len()
            )));
        }
        if self.checksum_modulo == 0 {
            return Err(MetaError::SpecInvalid("checksum modulo is zero".into()));
        }
        for (i, c) in self.encode_chars.iter().enumerate() {
            if self.encode_chars[..i].contains(c) {
                return Err(MetaError::SpecInvalid(format!(
                    "duplicate symbol {c:?} at index {i}"
                )));
            }
        }
        for (i, s) in self.symbol_order_strings.iter().enumerate() {
            if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
            {
                return Err(MetaError::SpecInvalid(format!(
                    "order string {s:?} at index {i} is not 8 lowercase hex digits"
                )));
            }
            if self.symbol_order_strings[..i].contains(s) {
                return Err(MetaError::SpecInvalid(format!(
                    "duplicate order string {s:?} at index {i}"
                )));
            }
        }
        Ok(())
    }

    /// Number of symbols in the alphabet.
    pub fn len(&self) -> usize {
        self.encode_chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encode_chars.is_empty()
    }

    /// The character a canonical order string decodes to, if any.
    pub fn char_for_order(&self, order_id: &str) -> Option<char> {
        self.symbol_order_strings
            .iter()
            .position(|s| s == order_id)
            .map(|i| self.encode_chars[i])
    }

    /// The canonical order string a character was transmitted as, if the
    /// character is in the alphabet.
    pub fn order_for_char(&self, c: char) -> Option<&str> {
        self.encode_chars
            .iter()
            .position(|&e| e == c)
            .map(|i| self.symbol_order_strings[i].as_str())
    }
}
