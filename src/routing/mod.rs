//! Routing Module
//!
//! Maps keys to the shard that owns them.
//!
//! ## Algorithm
//! 1. SHA-256 the key bytes, fold the digest to a 64-bit value
//! 2. Jump consistent hash over the digest and the shard count
//! 3. Index into the ordered assignment list
//!
//! The jump hash keeps remapping bounded when shards are appended: growing
//! from n to n+1 shards moves a given key with probability ~1/(n+1),
//! where plain `hash % n` would move nearly every key.

mod hash;
mod shard_map;

pub use hash::{jump_hash, key_digest};
pub use shard_map::{ShardAssignment, ShardMap};
