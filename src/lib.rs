//! # CompassKV
//!
//! Client library for a sharded key-value store:
//! - Consistent-hash routing of keys to shards (SHA-256 + jump hash)
//! - Shard-scoped read/write/delete over a binary TCP protocol
//! - Single-connection blocking client with opt-in retry
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       KvClient                               │
//! │              (put / get / delete / close)                    │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌──────────────┐
//!     │  ShardMap   │               │  Connection  │
//!     │ (key→shard) │               │  (TCP + I/O) │
//!     └─────────────┘               └──────┬───────┘
//!                                          │
//!                                          ▼
//!                                  ┌──────────────┐
//!                                  │ Shard Server │
//!                                  │  (external)  │
//!                                  └──────────────┘
//! ```
//!
//! The shard topology is fetched once at construction and is immutable for
//! the lifetime of the client. Keys route to shards via a jump consistent
//! hash over a SHA-256 digest, so growing the shard list by appending
//! remaps only a bounded fraction of keys.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod routing;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CompassError, Result};
pub use config::{BackoffStrategy, Config, RetryPolicy};
pub use routing::{ShardAssignment, ShardMap};
pub use client::KvClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CompassKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
