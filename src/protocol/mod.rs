//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Operations
//! - 0x01: ASSIGNMENTS - Payload: namespace_len (4) + namespace
//! - 0x02: WRITE       - Payload: shard_id (8) + puts + deletes
//! - 0x03: READ        - Payload: shard_id (8) + gets
//! - 0x04: PING        - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//!
//! READ responses may span multiple frames; each frame's payload starts
//! with a flags byte whose low bit marks the final frame of the stream.

mod request;
mod response;
mod codec;

pub use request::{DeleteEntry, GetEntry, PutEntry, Request, RequestType};
pub use response::{AssignmentSnapshot, Frame, ReadEntry, ReadFrame, Status};
pub use codec::{
    decode_assignment_snapshot, decode_frame, decode_read_frame, decode_request,
    encode_assignment_snapshot, encode_frame, encode_read_frame, encode_request,
    read_frame, read_request, write_frame, write_request,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
