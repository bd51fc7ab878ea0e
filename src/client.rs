//! Client Module
//!
//! The key-value client that coordinates routing and transport.
//!
//! ## Responsibilities
//! - Fetch the shard-assignment snapshot at construction
//! - Route each key to its owning shard
//! - Issue shard-scoped read/write requests and decode results
//! - Apply the configured retry policy around remote calls

use std::thread;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{CompassError, Result};
use crate::network::Connection;
use crate::protocol::{
    decode_assignment_snapshot, decode_read_frame, DeleteEntry, Frame, GetEntry, PutEntry,
    Request, Status,
};
use crate::routing::{ShardAssignment, ShardMap};

/// Client for a sharded key-value store
///
/// ## Concurrency Model
///
/// - The shard map is loaded once in `connect` and never changes, so
///   routing needs no lock and a caller can never observe a client
///   without a topology.
/// - Remote calls serialize on a single connection mutex; each call
///   blocks until its response frames are fully consumed, so frames of
///   different operations never interleave.
///
/// A fresh client must be constructed to pick up a new shard topology.
pub struct KvClient {
    /// Client configuration
    config: Config,

    /// Immutable shard topology for the configured namespace
    shard_map: ShardMap,

    /// The single connection to the shard service (exclusive per call)
    conn: Mutex<Connection>,
}

impl KvClient {
    /// Connect to the shard service and load the shard topology
    ///
    /// Steps:
    /// 1. Dial the server
    /// 2. Fetch the shard-assignment snapshot for the configured namespace
    /// 3. Build the immutable shard map
    ///
    /// Fails with `ServiceUnavailable` when no snapshot comes back and
    /// `NamespaceNotFound` when the namespace is absent from it. Either
    /// failure is fatal to construction.
    pub fn connect(config: Config) -> Result<Self> {
        let mut conn = Connection::connect(&config)?;

        let shard_map = Self::load_shard_map(&mut conn, &config)?;
        tracing::debug!(
            "Loaded {} shard assignments for namespace '{}'",
            shard_map.shard_count(),
            shard_map.namespace()
        );

        Ok(Self {
            config,
            shard_map,
            conn: Mutex::new(conn),
        })
    }

    /// Fetch the assignment snapshot and build the shard map
    fn load_shard_map(conn: &mut Connection, config: &Config) -> Result<ShardMap> {
        let request = Request::Assignments {
            namespace: config.namespace.clone(),
        };

        // Only the first emitted snapshot matters; the topology is fixed
        // for the lifetime of this client.
        let frame = conn.call(&request).map_err(|e| match e {
            CompassError::Io(io) => CompassError::ServiceUnavailable(io.to_string()),
            other => other,
        })?;

        let snapshot = match frame.status {
            Status::Ok => decode_assignment_snapshot(&frame.payload)?,
            Status::NotFound => {
                return Err(CompassError::NamespaceNotFound(config.namespace.clone()))
            }
            Status::Error => {
                return Err(CompassError::ServiceUnavailable(frame.error_message()))
            }
        };

        if snapshot.namespaces.is_empty() {
            return Err(CompassError::ServiceUnavailable(
                "assignment snapshot was empty".to_string(),
            ));
        }

        let shards = snapshot
            .namespace(&config.namespace)
            .ok_or_else(|| CompassError::NamespaceNotFound(config.namespace.clone()))?;

        let assignments = shards
            .iter()
            .copied()
            .map(ShardAssignment::new)
            .collect::<Vec<_>>();

        Ok(ShardMap::from_assignments(config.namespace.clone(), assignments))
    }

    // =========================================================================
    // Key-Value Operations
    // =========================================================================

    /// Put a key-value pair
    ///
    /// Routes the key to its shard and issues a single-upsert write.
    /// Fails with `ShardUnavailable` when the remote call cannot be
    /// completed.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let shard_id = self.shard_map.route(key.as_bytes())?;

        let request = Request::Write {
            shard_id,
            puts: vec![PutEntry {
                key: key.as_bytes().to_vec(),
                value: value.to_vec(),
            }],
            deletes: Vec::new(),
        };

        self.with_retry("put", || {
            let frame = self.call_shard(shard_id, &request)?;
            match frame.status {
                Status::Ok => Ok(()),
                Status::NotFound | Status::Error => {
                    Err(Self::shard_error(shard_id, &frame))
                }
            }
        })
    }

    /// Get the value for a key
    ///
    /// Routes the key to its shard and issues a read requesting the value.
    /// Returns `Ok(None)` when the key has no current value; absence is a
    /// result, never an error. A per-entry ERROR status from the shard
    /// propagates as `ShardUnavailable` rather than being folded into
    /// absence.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let shard_id = self.shard_map.route(key.as_bytes())?;

        let request = Request::Read {
            shard_id,
            gets: vec![GetEntry {
                key: key.as_bytes().to_vec(),
                include_value: true,
            }],
        };

        self.with_retry("get", || {
            let mut conn = self.conn.lock();

            let io_error = |io: std::io::Error| CompassError::ShardUnavailable {
                shard_id,
                reason: io.to_string(),
            };

            let mut frame = match conn.call(&request) {
                Ok(frame) => frame,
                Err(CompassError::Io(io)) => return Err(io_error(io)),
                Err(e) => return Err(e),
            };

            // Scan the (possibly streamed) outcome frames for the first
            // successful match; exhaustion without one means absent.
            loop {
                match frame.status {
                    Status::NotFound => return Ok(None),
                    Status::Error => return Err(Self::shard_error(shard_id, &frame)),
                    Status::Ok => {}
                }

                let read_frame = decode_read_frame(&frame.payload)?;
                for entry in read_frame.entries {
                    match entry.status {
                        Status::Ok => return Ok(Some(entry.payload)),
                        Status::NotFound => continue,
                        Status::Error => {
                            return Err(CompassError::ShardUnavailable {
                                shard_id,
                                reason: String::from_utf8_lossy(&entry.payload).into_owned(),
                            })
                        }
                    }
                }

                if read_frame.last {
                    return Ok(None);
                }
                frame = match conn.next_frame() {
                    Ok(frame) => frame,
                    Err(CompassError::Io(io)) => return Err(io_error(io)),
                    Err(e) => return Err(e),
                };
            }
        })
    }

    /// Delete a key
    ///
    /// Routes the key to its shard and issues a single-tombstone write.
    /// Deleting an absent key succeeds. Fails with `ShardUnavailable` on
    /// transport failure.
    pub fn delete(&self, key: &str) -> Result<()> {
        let shard_id = self.shard_map.route(key.as_bytes())?;

        let request = Request::Write {
            shard_id,
            puts: Vec::new(),
            deletes: vec![DeleteEntry {
                key: key.as_bytes().to_vec(),
            }],
        };

        self.with_retry("delete", || {
            let frame = self.call_shard(shard_id, &request)?;
            match frame.status {
                // NOT_FOUND from a delete means the key was already absent
                Status::Ok | Status::NotFound => Ok(()),
                Status::Error => Err(Self::shard_error(shard_id, &frame)),
            }
        })
    }

    /// Ping the server
    pub fn ping(&self) -> Result<()> {
        let frame = {
            let mut conn = self.conn.lock();
            conn.call(&Request::Ping)?
        };
        match frame.status {
            Status::Ok => Ok(()),
            _ => Err(CompassError::Protocol(format!(
                "Unexpected ping response: {:?}",
                frame.status
            ))),
        }
    }

    /// Close the client, draining in-flight data within the grace period
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner();
        conn.close(self.config.shutdown_grace)
    }

    // =========================================================================
    // Routing Accessors
    // =========================================================================

    /// Shard id the given key routes to
    pub fn shard_for(&self, key: &str) -> Result<u64> {
        self.shard_map.route(key.as_bytes())
    }

    /// The loaded shard topology
    pub fn shard_map(&self) -> &ShardMap {
        &self.shard_map
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Issue one request on the shared connection, mapping transport
    /// failures to `ShardUnavailable`
    fn call_shard(&self, shard_id: u64, request: &Request) -> Result<Frame> {
        let mut conn = self.conn.lock();
        match conn.call(request) {
            Ok(frame) => Ok(frame),
            Err(CompassError::Io(io)) => Err(CompassError::ShardUnavailable {
                shard_id,
                reason: io.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Build the error for a failed shard response
    fn shard_error(shard_id: u64, frame: &Frame) -> CompassError {
        let reason = if frame.payload.is_empty() {
            format!("shard returned {:?}", frame.status)
        } else {
            frame.error_message()
        };
        CompassError::ShardUnavailable { shard_id, reason }
    }

    /// Run a remote call under the configured retry policy
    ///
    /// The default policy is a single attempt; retries only happen when
    /// explicitly configured, and only for retryable failures.
    fn with_retry<T>(&self, op: &str, mut call: impl FnMut() -> Result<T>) -> Result<T> {
        let policy = &self.config.retry;
        let mut attempt = 1u32;

        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < policy.max_attempts && e.is_retryable() => {
                    let delay = policy.delay_before(attempt);
                    tracing::debug!(
                        "{} attempt {}/{} failed: {}; retrying after {:?}",
                        op,
                        attempt,
                        policy.max_attempts,
                        e,
                        delay
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
