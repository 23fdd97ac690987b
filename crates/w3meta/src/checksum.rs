//! Payload checksum.
//!
//! The map script runs a base-31 rolling hash over the payload text up to
//! (but not including) the `checksum:` line, keeping the accumulator inside
//! its 32-bit integer range with the spec's modulus, and transmits the
//! result on the `checksum:` line. Validation recomputes the same hash and
//! compares.

use crate::{MetadataSpec, MetaError};

/// Rolling hash of `text` modulo `modulo`.
pub fn compute_checksum(text: &str, modulo: u32) -> u32 {
    let modulo = u64::from(modulo.max(1));
    let mut acc: u64 = 0;
    for byte in text.bytes() {
        acc = (acc * 31 + u64::from(byte)) % modulo;
    }
    acc as u32
}

/// Verifies a declared checksum against the payload text.
pub fn verify_checksum(text: &str, declared: u32, spec: &MetadataSpec) -> Result<(), MetaError> {
    let computed = compute_checksum(text, spec.checksum_modulo);
    if computed != declared {
        return Err(MetaError::ChecksumMismatch { declared, computed });
    }
    Ok(())
}
