//! Shard map
//!
//! Immutable snapshot of the shard assignments for one namespace.

use crate::error::{CompassError, Result};
use crate::routing::hash::{jump_hash, key_digest};

/// Ownership of one hash bucket by a shard
///
/// The assignment's position in the ordered sequence is the bucket index
/// the jump hash selects; the shard id is what the wire protocol speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAssignment {
    /// Identifier of the owning shard
    pub shard_id: u64,
}

impl ShardAssignment {
    pub fn new(shard_id: u64) -> Self {
        Self { shard_id }
    }
}

/// Ordered shard assignments for a single namespace
///
/// Built once from a fetched snapshot and never mutated. Routing reads
/// need no synchronization; a topology change means constructing a whole
/// new map and swapping it in, never editing this one in place.
#[derive(Debug, Clone)]
pub struct ShardMap {
    /// Namespace this snapshot was fetched for
    namespace: String,

    /// Assignments in snapshot order; index = hash bucket
    assignments: Vec<ShardAssignment>,
}

impl ShardMap {
    /// Build a shard map from a fetched assignment snapshot
    pub fn from_assignments(
        namespace: impl Into<String>,
        assignments: Vec<ShardAssignment>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            assignments,
        }
    }

    /// Route a key to the shard that owns it
    ///
    /// Deterministic for a fixed map: the same key always lands on the
    /// same shard id. Fails with `EmptyShardMap` when no assignments are
    /// loaded.
    pub fn route(&self, key: &[u8]) -> Result<u64> {
        if self.assignments.is_empty() {
            return Err(CompassError::EmptyShardMap);
        }

        let digest = key_digest(key);
        let bucket = jump_hash(digest, self.assignments.len() as u32);

        Ok(self.assignments[bucket as usize].shard_id)
    }

    /// Namespace this map routes for
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of shard assignments
    pub fn shard_count(&self) -> usize {
        self.assignments.len()
    }

    /// True if no assignments are loaded
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assignments in snapshot order
    pub fn assignments(&self) -> &[ShardAssignment] {
        &self.assignments
    }
}
