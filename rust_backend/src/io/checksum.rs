//! Fingerprinting of the reference tables.

use sha2::{Digest, Sha256};

/// SHA-256 over the given table contents, in order, hex encoded.
///
/// Each part is length-prefixed so that moving bytes from one table to the
/// other changes the fingerprint.
pub fn fingerprint_tables(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
