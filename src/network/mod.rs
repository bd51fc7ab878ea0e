//! Network Module
//!
//! Blocking TCP transport to the shard service.
//!
//! ## Architecture
//! - One connection per client
//! - Request out, one or more response frames back
//! - Bounded-grace shutdown on close

mod connection;

pub use connection::Connection;
