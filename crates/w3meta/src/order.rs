//! Canonical order-identifier formatting.
//!
//! The container stores a unit order identifier as 4 little-endian bytes.
//! The canonical form used throughout the pipeline is the byte-reversed
//! sequence re-encoded as lowercase hex, so a 4-byte identifier always
//! yields an 8-character string (`[0x03, 0x00, 0x0d, 0x00]` → `"000d0003"`).
//!
//! [`order_id_to_string`] applies the identical transform to a numeric
//! identifier. The spec registry derives its lookup table through it, which
//! is the symmetry the whole order channel rests on: the table and the
//! decoder can only disagree if the engine's byte order itself changes.

/// Formats a raw little-endian order field into its canonical hex string.
///
/// Returns `None` for any length other than 4 — callers treat that as "not
/// a recognizable order" and skip the action rather than failing.
pub fn order_string(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 4 {
        return None;
    }
    let mut out = String::with_capacity(8);
    for b in bytes.iter().rev() {
        out.push_str(&format!("{b:02x}"));
    }
    Some(out)
}

/// Canonical hex string for a numeric 32-bit order identifier.
pub fn order_id_to_string(id: u32) -> String {
    format!("{id:08x}")
}
