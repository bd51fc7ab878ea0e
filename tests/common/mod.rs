//! Shared test fixture
//!
//! A loopback shard server speaking the wire protocol over an in-memory
//! map, so client behavior is tested end to end without an external
//! service. Storage is keyed by (shard_id, key): an operation sent to the
//! wrong shard misses, which makes routing mistakes visible in tests.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use compasskv::protocol::{
    encode_assignment_snapshot, encode_read_frame, read_request, write_frame,
    AssignmentSnapshot, Frame, ReadEntry, ReadFrame, Request,
};

/// Behavior knobs for the loopback server
#[derive(Clone)]
pub struct ServerOptions {
    /// Ordered shard ids advertised for `namespace`
    pub shard_ids: Vec<u64>,

    /// Namespace the server knows about
    pub namespace: String,

    /// Answer this many WRITE/READ requests with an ERROR frame first
    pub fail_ops: usize,

    /// Serve an assignment snapshot with zero namespaces
    pub empty_snapshot: bool,

    /// Prefix READ responses with an empty non-final frame
    pub stream_empty_prefix: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            shard_ids: vec![0, 1, 2],
            namespace: "default".to_string(),
            fail_ops: 0,
            empty_snapshot: false,
            stream_empty_prefix: false,
        }
    }
}

type ShardStore = Arc<Mutex<HashMap<(u64, Vec<u8>), Vec<u8>>>>;

/// Loopback shard server for tests
pub struct TestServer {
    addr: String,
    store: ShardStore,
}

impl TestServer {
    /// Start a server with default options and the given shard ids
    pub fn start(shard_ids: &[u64]) -> Self {
        Self::start_with(ServerOptions {
            shard_ids: shard_ids.to_vec(),
            ..ServerOptions::default()
        })
    }

    /// Start a server with explicit options
    pub fn start_with(options: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let store: ShardStore = Arc::new(Mutex::new(HashMap::new()));
        let fail_budget = Arc::new(AtomicUsize::new(options.fail_ops));

        {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    let store = Arc::clone(&store);
                    let options = options.clone();
                    let fail_budget = Arc::clone(&fail_budget);
                    thread::spawn(move || {
                        handle_connection(stream, store, options, fail_budget);
                    });
                }
            });
        }

        Self { addr, store }
    }

    /// Address the server listens on
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Shard ids that currently hold at least one key
    pub fn shards_with_data(&self) -> Vec<u64> {
        let mut shards: Vec<u64> = self
            .store
            .lock()
            .unwrap()
            .keys()
            .map(|(shard_id, _)| *shard_id)
            .collect();
        shards.sort_unstable();
        shards.dedup();
        shards
    }

    /// Raw lookup bypassing the protocol
    pub fn value_at(&self, shard_id: u64, key: &[u8]) -> Option<Vec<u8>> {
        self.store
            .lock()
            .unwrap()
            .get(&(shard_id, key.to_vec()))
            .cloned()
    }
}

fn handle_connection(
    stream: TcpStream,
    store: ShardStore,
    options: ServerOptions,
    fail_budget: Arc<AtomicUsize>,
) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream);

    loop {
        let request = match read_request(&mut reader) {
            Ok(request) => request,
            // Client closed the connection
            Err(_) => return,
        };

        match request {
            Request::Assignments { namespace } => {
                let frame = if options.empty_snapshot {
                    Frame::ok(encode_assignment_snapshot(&AssignmentSnapshot::default()))
                } else if namespace == options.namespace {
                    let snapshot = AssignmentSnapshot {
                        namespaces: vec![(options.namespace.clone(), options.shard_ids.clone())],
                    };
                    Frame::ok(encode_assignment_snapshot(&snapshot))
                } else {
                    Frame::not_found()
                };
                if write_frame(&mut writer, &frame).is_err() {
                    return;
                }
            }

            Request::Write {
                shard_id,
                puts,
                deletes,
            } => {
                if take_failure(&fail_budget) {
                    if write_frame(&mut writer, &Frame::error("injected failure")).is_err() {
                        return;
                    }
                    continue;
                }

                let mut data = store.lock().unwrap();
                for put in puts {
                    data.insert((shard_id, put.key), put.value);
                }
                for delete in deletes {
                    data.remove(&(shard_id, delete.key));
                }
                drop(data);

                if write_frame(&mut writer, &Frame::ok_empty()).is_err() {
                    return;
                }
            }

            Request::Read { shard_id, gets } => {
                if take_failure(&fail_budget) {
                    if write_frame(&mut writer, &Frame::error("injected failure")).is_err() {
                        return;
                    }
                    continue;
                }

                if options.stream_empty_prefix {
                    let prefix = ReadFrame {
                        last: false,
                        entries: Vec::new(),
                    };
                    if write_frame(&mut writer, &Frame::ok(encode_read_frame(&prefix))).is_err() {
                        return;
                    }
                }

                let data = store.lock().unwrap();
                let entries: Vec<ReadEntry> = gets
                    .iter()
                    .map(|get| match data.get(&(shard_id, get.key.clone())) {
                        Some(value) if get.include_value => ReadEntry::ok(value.clone()),
                        Some(_) => ReadEntry::ok(Vec::new()),
                        None => ReadEntry::not_found(),
                    })
                    .collect();
                drop(data);

                let frame = ReadFrame {
                    last: true,
                    entries,
                };
                if write_frame(&mut writer, &Frame::ok(encode_read_frame(&frame))).is_err() {
                    return;
                }
            }

            Request::Ping => {
                if write_frame(&mut writer, &Frame::ok(b"PONG".to_vec())).is_err() {
                    return;
                }
            }
        }
    }
}

/// Consume one unit of the failure budget, if any remains
fn take_failure(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
