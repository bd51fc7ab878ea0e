//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Operation
//! - ASSIGNMENTS: ns_len (4) + namespace
//! - WRITE: shard_id (8) + put_count (4) + [key_len (4) + key + val_len (4) + val]*
//!          + delete_count (4) + [key_len (4) + key]*
//! - READ:  shard_id (8) + get_count (4) + [key_len (4) + key + include_value (1)]*
//! - PING:  empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Typed Response Payloads
//! - ASSIGNMENTS: ns_count (4) + [ns_len (4) + ns + shard_count (4) + [shard_id (8)]*]*
//! - READ frame:  flags (1, bit0 = last) + entry_count (4)
//!                + [status (1) + len (4) + payload]*
//! - WRITE / PING: empty on OK, message bytes on ERROR

use std::io::{Read, Write};

use crate::error::{CompassError, Result};
use super::{
    AssignmentSnapshot, DeleteEntry, Frame, GetEntry, PutEntry, ReadEntry, ReadFrame, Request,
    Status,
};

/// Header size: 1 byte op/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Flag bit marking the final frame of a read stream
const READ_FLAG_LAST: u8 = 0x01;

// =============================================================================
// Payload Cursor Helpers
// =============================================================================

fn take_u8(payload: &[u8], offset: &mut usize, what: &str) -> Result<u8> {
    if payload.len() < *offset + 1 {
        return Err(CompassError::Protocol(format!("{}: missing byte", what)));
    }
    let value = payload[*offset];
    *offset += 1;
    Ok(value)
}

fn take_u32(payload: &[u8], offset: &mut usize, what: &str) -> Result<u32> {
    if payload.len() < *offset + 4 {
        return Err(CompassError::Protocol(format!(
            "{}: missing length field",
            what
        )));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&payload[*offset..*offset + 4]);
    *offset += 4;
    Ok(u32::from_be_bytes(buf))
}

fn take_u64(payload: &[u8], offset: &mut usize, what: &str) -> Result<u64> {
    if payload.len() < *offset + 8 {
        return Err(CompassError::Protocol(format!(
            "{}: missing shard id",
            what
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&payload[*offset..*offset + 8]);
    *offset += 8;
    Ok(u64::from_be_bytes(buf))
}

fn take_bytes<'a>(
    payload: &'a [u8],
    offset: &mut usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8]> {
    if payload.len() < *offset + len {
        return Err(CompassError::Protocol(format!(
            "{}: incomplete data (expected {}, got {})",
            what,
            len,
            payload.len() - *offset
        )));
    }
    let bytes = &payload[*offset..*offset + len];
    *offset += len;
    Ok(bytes)
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: op (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Vec<u8> {
    let op = request.request_type() as u8;

    // Build payload based on request type
    let payload = match request {
        Request::Assignments { namespace } => {
            let mut payload = Vec::with_capacity(4 + namespace.len());
            put_bytes(&mut payload, namespace.as_bytes());
            payload
        }
        Request::Write {
            shard_id,
            puts,
            deletes,
        } => {
            let mut payload = Vec::new();
            payload.extend_from_slice(&shard_id.to_be_bytes());
            payload.extend_from_slice(&(puts.len() as u32).to_be_bytes());
            for put in puts {
                put_bytes(&mut payload, &put.key);
                put_bytes(&mut payload, &put.value);
            }
            payload.extend_from_slice(&(deletes.len() as u32).to_be_bytes());
            for delete in deletes {
                put_bytes(&mut payload, &delete.key);
            }
            payload
        }
        Request::Read { shard_id, gets } => {
            let mut payload = Vec::new();
            payload.extend_from_slice(&shard_id.to_be_bytes());
            payload.extend_from_slice(&(gets.len() as u32).to_be_bytes());
            for get in gets {
                put_bytes(&mut payload, &get.key);
                payload.push(get.include_value as u8);
            }
            payload
        }
        Request::Ping => Vec::new(),
    };

    // Build full message: header + payload
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(op);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);

    message
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    if bytes.len() < HEADER_SIZE {
        return Err(CompassError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    // Parse header
    let op = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(CompassError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(CompassError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let payload = &bytes[HEADER_SIZE..total_len];

    // Parse request based on op
    match op {
        0x01 => decode_assignments_request(payload),
        0x02 => decode_write_request(payload),
        0x03 => decode_read_request(payload),
        0x04 => decode_ping_request(payload),
        _ => Err(CompassError::Protocol(format!(
            "Unknown request op: 0x{:02x}",
            op
        ))),
    }
}

/// Decode ASSIGNMENTS request payload
fn decode_assignments_request(payload: &[u8]) -> Result<Request> {
    let mut offset = 0;
    let ns_len = take_u32(payload, &mut offset, "ASSIGNMENTS request")? as usize;
    let ns_bytes = take_bytes(payload, &mut offset, ns_len, "ASSIGNMENTS namespace")?;

    let namespace = String::from_utf8(ns_bytes.to_vec())
        .map_err(|_| CompassError::Protocol("ASSIGNMENTS namespace: invalid UTF-8".to_string()))?;

    Ok(Request::Assignments { namespace })
}

/// Decode WRITE request payload
fn decode_write_request(payload: &[u8]) -> Result<Request> {
    let mut offset = 0;
    let shard_id = take_u64(payload, &mut offset, "WRITE request")?;

    let put_count = take_u32(payload, &mut offset, "WRITE puts")? as usize;
    let mut puts = Vec::with_capacity(put_count);
    for _ in 0..put_count {
        let key_len = take_u32(payload, &mut offset, "WRITE put key")? as usize;
        let key = take_bytes(payload, &mut offset, key_len, "WRITE put key")?.to_vec();
        let val_len = take_u32(payload, &mut offset, "WRITE put value")? as usize;
        let value = take_bytes(payload, &mut offset, val_len, "WRITE put value")?.to_vec();
        puts.push(PutEntry { key, value });
    }

    let delete_count = take_u32(payload, &mut offset, "WRITE deletes")? as usize;
    let mut deletes = Vec::with_capacity(delete_count);
    for _ in 0..delete_count {
        let key_len = take_u32(payload, &mut offset, "WRITE delete key")? as usize;
        let key = take_bytes(payload, &mut offset, key_len, "WRITE delete key")?.to_vec();
        deletes.push(DeleteEntry { key });
    }

    Ok(Request::Write {
        shard_id,
        puts,
        deletes,
    })
}

/// Decode READ request payload
fn decode_read_request(payload: &[u8]) -> Result<Request> {
    let mut offset = 0;
    let shard_id = take_u64(payload, &mut offset, "READ request")?;

    let get_count = take_u32(payload, &mut offset, "READ gets")? as usize;
    let mut gets = Vec::with_capacity(get_count);
    for _ in 0..get_count {
        let key_len = take_u32(payload, &mut offset, "READ get key")? as usize;
        let key = take_bytes(payload, &mut offset, key_len, "READ get key")?.to_vec();
        let include_value = take_u8(payload, &mut offset, "READ include_value")? != 0;
        gets.push(GetEntry { key, include_value });
    }

    Ok(Request::Read { shard_id, gets })
}

/// Decode PING request payload
fn decode_ping_request(payload: &[u8]) -> Result<Request> {
    if !payload.is_empty() {
        return Err(CompassError::Protocol(format!(
            "PING request: unexpected payload of {} bytes",
            payload.len()
        )));
    }
    Ok(Request::Ping)
}

// =============================================================================
// Response Frame Encoding/Decoding
// =============================================================================

/// Encode a response frame to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + frame.payload.len());
    message.push(frame.status as u8);
    message.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&frame.payload);

    message
}

/// Decode a response frame from bytes
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < HEADER_SIZE {
        return Err(CompassError::Protocol(format!(
            "Incomplete response header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    // Parse header
    let status_byte = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(CompassError::Protocol(format!(
            "Response payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(CompassError::Protocol(format!(
            "Incomplete response payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let status = decode_status(status_byte)?;
    let payload = bytes[HEADER_SIZE..total_len].to_vec();

    Ok(Frame { status, payload })
}

fn decode_status(byte: u8) -> Result<Status> {
    match byte {
        0x00 => Ok(Status::Ok),
        0x01 => Ok(Status::NotFound),
        0x02 => Ok(Status::Error),
        _ => Err(CompassError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            byte
        ))),
    }
}

// =============================================================================
// Typed Response Payloads
// =============================================================================

/// Encode an assignment snapshot into a response payload
pub fn encode_assignment_snapshot(snapshot: &AssignmentSnapshot) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(snapshot.namespaces.len() as u32).to_be_bytes());
    for (namespace, shards) in &snapshot.namespaces {
        put_bytes(&mut payload, namespace.as_bytes());
        payload.extend_from_slice(&(shards.len() as u32).to_be_bytes());
        for shard_id in shards {
            payload.extend_from_slice(&shard_id.to_be_bytes());
        }
    }
    payload
}

/// Decode an assignment snapshot from a response payload
pub fn decode_assignment_snapshot(payload: &[u8]) -> Result<AssignmentSnapshot> {
    let mut offset = 0;
    let ns_count = take_u32(payload, &mut offset, "ASSIGNMENTS response")? as usize;

    let mut namespaces = Vec::with_capacity(ns_count);
    for _ in 0..ns_count {
        let ns_len = take_u32(payload, &mut offset, "ASSIGNMENTS namespace")? as usize;
        let ns_bytes = take_bytes(payload, &mut offset, ns_len, "ASSIGNMENTS namespace")?;
        let namespace = String::from_utf8(ns_bytes.to_vec()).map_err(|_| {
            CompassError::Protocol("ASSIGNMENTS namespace: invalid UTF-8".to_string())
        })?;

        let shard_count = take_u32(payload, &mut offset, "ASSIGNMENTS shards")? as usize;
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(take_u64(payload, &mut offset, "ASSIGNMENTS shard id")?);
        }

        namespaces.push((namespace, shards));
    }

    Ok(AssignmentSnapshot { namespaces })
}

/// Encode a read frame into a response payload
pub fn encode_read_frame(frame: &ReadFrame) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(if frame.last { READ_FLAG_LAST } else { 0 });
    payload.extend_from_slice(&(frame.entries.len() as u32).to_be_bytes());
    for entry in &frame.entries {
        payload.push(entry.status as u8);
        put_bytes(&mut payload, &entry.payload);
    }
    payload
}

/// Decode a read frame from a response payload
pub fn decode_read_frame(payload: &[u8]) -> Result<ReadFrame> {
    let mut offset = 0;
    let flags = take_u8(payload, &mut offset, "READ response flags")?;
    let entry_count = take_u32(payload, &mut offset, "READ response entries")? as usize;

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let status = decode_status(take_u8(payload, &mut offset, "READ entry status")?)?;
        let len = take_u32(payload, &mut offset, "READ entry payload")? as usize;
        let entry_payload = take_bytes(payload, &mut offset, len, "READ entry payload")?.to_vec();
        entries.push(ReadEntry {
            status,
            payload: entry_payload,
        });
    }

    Ok(ReadFrame {
        last: flags & READ_FLAG_LAST != 0,
        entries,
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let full_message = read_message(reader)?;
    decode_request(&full_message)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response frame from a stream
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let full_message = read_message(reader)?;
    decode_frame(&full_message)
}

/// Write a response frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    let bytes = encode_frame(frame);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed message (header + payload) from a stream
fn read_message<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    // Parse payload length
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(CompassError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    // Read payload
    let mut message = Vec::with_capacity(HEADER_SIZE + payload_len);
    message.extend_from_slice(&header);
    message.resize(HEADER_SIZE + payload_len, 0);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}
