//! Response definitions
//!
//! Frames and typed payloads received from the server.

/// Response status codes
///
/// Also used per-entry inside read frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

/// A raw response frame
///
/// The payload's meaning depends on the request that was issued: an
/// assignment snapshot, a read frame, an error message, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Status code
    pub status: Status,

    /// Payload bytes (empty when the response carries none)
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create an OK frame with a payload
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK frame with no payload
    pub fn ok_empty() -> Self {
        Self {
            status: Status::Ok,
            payload: Vec::new(),
        }
    }

    /// Create a NOT_FOUND frame
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: Vec::new(),
        }
    }

    /// Create an ERROR frame
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: message.as_bytes().to_vec(),
        }
    }

    /// Error message carried by an ERROR frame
    pub fn error_message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Shard-assignment snapshot for one or more namespaces
///
/// Assignment order within a namespace is significant: the position in the
/// list is the hash bucket the routing layer indexes into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentSnapshot {
    /// (namespace, ordered shard ids) pairs
    pub namespaces: Vec<(String, Vec<u64>)>,
}

impl AssignmentSnapshot {
    /// Ordered shard ids for a namespace, if present in the snapshot
    pub fn namespace(&self, name: &str) -> Option<&[u64]> {
        self.namespaces
            .iter()
            .find(|(ns, _)| ns == name)
            .map(|(_, shards)| shards.as_slice())
    }
}

/// One lookup outcome inside a read frame
///
/// Payload is the value bytes when `status` is OK, an error message when
/// ERROR, and empty when NOT_FOUND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntry {
    pub status: Status,
    pub payload: Vec<u8>,
}

impl ReadEntry {
    /// An entry carrying a found value
    pub fn ok(value: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            payload: value,
        }
    }

    /// An entry for an absent key
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: Vec::new(),
        }
    }

    /// An entry for a per-key failure
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: message.as_bytes().to_vec(),
        }
    }
}

/// One frame of a (possibly streamed) read response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFrame {
    /// True on the final frame of the stream
    pub last: bool,

    /// Outcomes in request order
    pub entries: Vec<ReadEntry>,
}
