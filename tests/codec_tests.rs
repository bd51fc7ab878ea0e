//! Codec Tests
//!
//! Tests for request and response encoding/decoding.

use std::io::Cursor;
use compasskv::protocol::{
    decode_assignment_snapshot, decode_frame, decode_read_frame, decode_request,
    encode_assignment_snapshot, encode_frame, encode_read_frame, encode_request,
    read_frame, read_request, write_frame, write_request,
    AssignmentSnapshot, DeleteEntry, Frame, GetEntry, PutEntry, ReadEntry, ReadFrame,
    Request, Status,
};

// =============================================================================
// Request Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_assignments() {
    let req = Request::Assignments {
        namespace: "default".to_string(),
    };
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Assignments { namespace } => assert_eq!(namespace, "default"),
        _ => panic!("Expected ASSIGNMENTS request"),
    }
}

#[test]
fn test_encode_decode_write() {
    let req = Request::Write {
        shard_id: 3,
        puts: vec![PutEntry {
            key: b"mykey".to_vec(),
            value: b"myvalue".to_vec(),
        }],
        deletes: vec![DeleteEntry {
            key: b"gone".to_vec(),
        }],
    };
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Write {
            shard_id,
            puts,
            deletes,
        } => {
            assert_eq!(shard_id, 3);
            assert_eq!(puts.len(), 1);
            assert_eq!(puts[0].key, b"mykey");
            assert_eq!(puts[0].value, b"myvalue");
            assert_eq!(deletes.len(), 1);
            assert_eq!(deletes[0].key, b"gone");
        }
        _ => panic!("Expected WRITE request"),
    }
}

#[test]
fn test_encode_decode_read() {
    let req = Request::Read {
        shard_id: 9,
        gets: vec![GetEntry {
            key: b"hello".to_vec(),
            include_value: true,
        }],
    };
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Read { shard_id, gets } => {
            assert_eq!(shard_id, 9);
            assert_eq!(gets.len(), 1);
            assert_eq!(gets[0].key, b"hello");
            assert!(gets[0].include_value);
        }
        _ => panic!("Expected READ request"),
    }
}

#[test]
fn test_encode_decode_ping() {
    let req = Request::Ping;
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Ping => {}
        _ => panic!("Expected PING request"),
    }
}

#[test]
fn test_encode_decode_write_empty_batches() {
    let req = Request::Write {
        shard_id: 0,
        puts: vec![],
        deletes: vec![],
    };
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Write { puts, deletes, .. } => {
            assert!(puts.is_empty());
            assert!(deletes.is_empty());
        }
        _ => panic!("Expected WRITE request"),
    }
}

#[test]
fn test_encode_decode_binary_value() {
    // Values are opaque bytes, including nulls and high bytes
    let binary_value: Vec<u8> = (0..=255).collect();
    let req = Request::Write {
        shard_id: 1,
        puts: vec![PutEntry {
            key: vec![0x00, 0x01, 0xFF, 0xFE],
            value: binary_value.clone(),
        }],
        deletes: vec![],
    };
    let encoded = encode_request(&req);
    let decoded = decode_request(&encoded).unwrap();

    match decoded {
        Request::Write { puts, .. } => {
            assert_eq!(puts[0].key, vec![0x00, 0x01, 0xFF, 0xFE]);
            assert_eq!(puts[0].value, binary_value);
        }
        _ => panic!("Expected WRITE request"),
    }
}

// =============================================================================
// Response Frame Tests
// =============================================================================

#[test]
fn test_encode_decode_frame_ok() {
    let frame = Frame::ok(b"payload".to_vec());
    let encoded = encode_frame(&frame);
    let decoded = decode_frame(&encoded).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, b"payload");
}

#[test]
fn test_encode_decode_frame_not_found() {
    let frame = Frame::not_found();
    let encoded = encode_frame(&frame);
    let decoded = decode_frame(&encoded).unwrap();

    assert_eq!(decoded.status, Status::NotFound);
    assert!(decoded.payload.is_empty());
}

#[test]
fn test_encode_decode_frame_error() {
    let frame = Frame::error("something went wrong");
    let encoded = encode_frame(&frame);
    let decoded = decode_frame(&encoded).unwrap();

    assert_eq!(decoded.status, Status::Error);
    assert_eq!(decoded.error_message(), "something went wrong");
}

// =============================================================================
// Typed Payload Tests
// =============================================================================

#[test]
fn test_assignment_snapshot_round_trip() {
    let snapshot = AssignmentSnapshot {
        namespaces: vec![
            ("default".to_string(), vec![0, 1, 2, 3]),
            ("other".to_string(), vec![17]),
        ],
    };
    let payload = encode_assignment_snapshot(&snapshot);
    let decoded = decode_assignment_snapshot(&payload).unwrap();

    assert_eq!(decoded, snapshot);
    assert_eq!(decoded.namespace("default"), Some(&[0u64, 1, 2, 3][..]));
    assert_eq!(decoded.namespace("other"), Some(&[17u64][..]));
    assert_eq!(decoded.namespace("missing"), None);
}

#[test]
fn test_assignment_snapshot_preserves_order() {
    // Assignment order is the hash bucket order; it must survive the wire
    let snapshot = AssignmentSnapshot {
        namespaces: vec![("default".to_string(), vec![5, 3, 9, 1])],
    };
    let decoded = decode_assignment_snapshot(&encode_assignment_snapshot(&snapshot)).unwrap();
    assert_eq!(decoded.namespace("default"), Some(&[5u64, 3, 9, 1][..]));
}

#[test]
fn test_read_frame_round_trip() {
    let frame = ReadFrame {
        last: true,
        entries: vec![
            ReadEntry::ok(b"value".to_vec()),
            ReadEntry::not_found(),
            ReadEntry::error("shard fault"),
        ],
    };
    let payload = encode_read_frame(&frame);
    let decoded = decode_read_frame(&payload).unwrap();

    assert_eq!(decoded, frame);
}

#[test]
fn test_read_frame_last_flag() {
    let not_last = ReadFrame {
        last: false,
        entries: vec![],
    };
    let decoded = decode_read_frame(&encode_read_frame(&not_last)).unwrap();
    assert!(!decoded.last);

    let last = ReadFrame {
        last: true,
        entries: vec![],
    };
    let decoded = decode_read_frame(&encode_read_frame(&last)).unwrap();
    assert!(decoded.last);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x01, 0x00, 0x00]; // Only 3 bytes, need 5
    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Incomplete header"));
}

#[test]
fn test_incomplete_payload() {
    // Header says 10 bytes payload, but only 1 provided
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00];
    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Incomplete"));
}

#[test]
fn test_unknown_request_op() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Unknown request op"));
}

#[test]
fn test_unknown_response_status() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_frame(&bytes);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unknown response status"));
}

#[test]
fn test_ping_with_unexpected_payload() {
    let bytes = [0x04, 0x00, 0x00, 0x00, 0x02, 0x68, 0x69];
    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("unexpected payload"));
}

#[test]
fn test_write_truncated_put() {
    // WRITE with put_count = 1 but no put data
    let mut payload = Vec::new();
    payload.extend_from_slice(&1u64.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());

    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);

    let result = decode_request(&bytes);
    assert!(result.is_err());
}

#[test]
fn test_assignments_invalid_utf8() {
    let mut payload = Vec::new();
    payload.extend_from_slice(&2u32.to_be_bytes());
    payload.extend_from_slice(&[0xFF, 0xFE]);

    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);

    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("UTF-8"));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_request() {
    let req = Request::Write {
        shard_id: 2,
        puts: vec![PutEntry {
            key: b"key".to_vec(),
            value: b"value".to_vec(),
        }],
        deletes: vec![],
    };

    let mut buffer = Vec::new();
    write_request(&mut buffer, &req).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_request(&mut cursor).unwrap();

    match decoded {
        Request::Write { shard_id, puts, .. } => {
            assert_eq!(shard_id, 2);
            assert_eq!(puts[0].key, b"key");
            assert_eq!(puts[0].value, b"value");
        }
        _ => panic!("Expected WRITE request"),
    }
}

#[test]
fn test_stream_write_read_frame() {
    let frame = Frame::ok(b"result".to_vec());

    let mut buffer = Vec::new();
    write_frame(&mut buffer, &frame).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_frame(&mut cursor).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, b"result");
}

#[test]
fn test_stream_multiple_frames() {
    let frames = vec![
        Frame::ok(b"data".to_vec()),
        Frame::not_found(),
        Frame::error("oops"),
        Frame::ok_empty(),
    ];

    // Write all frames to buffer
    let mut buffer = Vec::new();
    for frame in &frames {
        write_frame(&mut buffer, frame).unwrap();
    }

    // Read them back
    let mut cursor = Cursor::new(buffer);
    for expected in &frames {
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(&decoded, expected);
    }
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_assignments() {
    let req = Request::Assignments {
        namespace: "ns".to_string(),
    };
    let encoded = encode_request(&req);

    // Expected: [0x01][0x00 0x00 0x00 0x06][0x00 0x00 0x00 0x02][n s]
    //           op    payload_len(6)       ns_len(2)           ns
    assert_eq!(encoded[0], 0x01);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x06]);
    assert_eq!(&encoded[5..9], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(&encoded[9..11], b"ns");
}

#[test]
fn test_wire_format_frame_ok() {
    let frame = Frame::ok(b"hi".to_vec());
    let encoded = encode_frame(&frame);

    // Expected: [0x00][0x00 0x00 0x00 0x02][h i]
    //           status payload_len(2)      payload
    assert_eq!(encoded[0], 0x00);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(&encoded[5..7], b"hi");
}
