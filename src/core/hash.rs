//! Stable 64-bit content hashes
//!
//! These hashes are written to disk (string table entries, object GUID top
//! bits), so they must not depend on the process or platform.

use sha2::{Digest, Sha256};

/// Hash a byte string to 64 bits.
pub fn hash64(bytes: impl AsRef<[u8]>) -> u64 {
    hash64_seeded(bytes, 0)
}

/// Hash a byte string to 64 bits, chaining from a previous hash value.
///
/// `hash64_seeded(model, hash64(material))` identifies a model+material pair.
pub fn hash64_seeded(bytes: impl AsRef<[u8]>, seed: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(bytes.as_ref());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}
