//! Key hashing
//!
//! SHA-256 key digests and the jump consistent hash used to pick a bucket.

use sha2::{Digest, Sha256};

/// Multiplier from the jump-hash LCG step
const JUMP_LCG_MULTIPLIER: u64 = 2862933555777941757;

/// Digest a key to a 64-bit routing value
///
/// Computes SHA-256 over the key bytes and folds the leading eight digest
/// bytes into a u64. The full digest is wider than needed; 64 bits is
/// plenty of entropy for bucket selection.
pub fn key_digest(key: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(key);
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

/// Jump consistent hash: map a 64-bit key to a bucket in `[0, buckets)`
///
/// Deterministic for a fixed (key, buckets) pair. When `buckets` grows from
/// n to n+1, a given key changes bucket with probability 1/(n+1), which is
/// the minimum possible for a balanced consistent hash.
///
/// # Panics
/// Debug-asserts that `buckets > 0`; callers guard the empty case.
pub fn jump_hash(key: u64, buckets: u32) -> u32 {
    debug_assert!(buckets > 0, "jump_hash requires at least one bucket");

    let mut key = key;
    let mut b: i64 = -1;
    let mut j: i64 = 0;

    while j < buckets as i64 {
        b = j;
        key = key.wrapping_mul(JUMP_LCG_MULTIPLIER).wrapping_add(1);
        j = ((b.wrapping_add(1) as f64) * ((1u64 << 31) as f64 / ((key >> 33).wrapping_add(1) as f64)))
            as i64;
    }

    b as u32
}
