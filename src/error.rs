//! Error types for CompassKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CompassError
pub type Result<T> = std::result::Result<T, CompassError>;

/// Unified error type for CompassKV operations
#[derive(Debug, Error)]
pub enum CompassError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Shard Assignment Errors
    // -------------------------------------------------------------------------
    #[error("Shard assignment service returned no data: {0}")]
    ServiceUnavailable(String),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Shard map has no assignments")]
    EmptyShardMap,

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("Shard {shard_id} unavailable: {reason}")]
    ShardUnavailable { shard_id: u64, reason: String },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompassError {
    /// True if the error is worth retrying under a retry policy
    ///
    /// Only per-operation transport failures qualify; load-time and
    /// configuration errors are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompassError::ShardUnavailable { .. } | CompassError::Io(_)
        )
    }
}
