// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::io::Cursor;

use bytes::BytesMut;
use hytale_server_rs::codec::{
    error::DecodeError,
    frame::{FrameError, NoCompression, decode_frame, encode_frame},
};

const PING_ID: u32 = 2;
const AUDIO_CATEGORIES_ID: u32 = 80;

#[test]
fn test_uncompressed_frame_roundtrip() {
    let payload = [0u8; 12];
    let mut buf = BytesMut::new();
    encode_frame(&mut buf, PING_ID, &payload, &NoCompression).expect("encode failed");

    // id varint, length varint, then the raw payload.
    assert_eq!(buf[0], PING_ID as u8);
    assert_eq!(buf[1], 12);
    assert_eq!(buf.len(), 14);

    let frozen = buf.freeze();
    let mut cur = Cursor::new(frozen.as_ref());
    let frame = decode_frame(&mut cur, &NoCompression).expect("decode failed");
    assert_eq!(frame.id, PING_ID);
    assert_eq!(frame.payload, payload);
    assert_eq!(cur.position() as usize, frozen.len());
}

#[test]
fn test_compressed_frame_roundtrip() {
    // Empty UpdateAudioCategories body; asset packets travel compressed.
    let payload = [0x01u8, 0, 0, 0, 0, 0, 0];
    let mut buf = BytesMut::new();
    encode_frame(&mut buf, AUDIO_CATEGORIES_ID, &payload, &NoCompression)
        .expect("encode failed");

    let frozen = buf.freeze();
    let mut cur = Cursor::new(frozen.as_ref());
    let frame = decode_frame(&mut cur, &NoCompression).expect("decode failed");
    assert_eq!(frame.id, AUDIO_CATEGORIES_ID);
    assert_eq!(frame.payload, payload);
}

#[test]
fn test_unknown_id_is_rejected() {
    let mut buf = BytesMut::new();
    let err = encode_frame(&mut buf, 9999, &[0u8; 4], &NoCompression)
        .expect_err("expected failure");
    assert!(matches!(
        err,
        FrameError::Decode(DecodeError::UnknownPacket(9999))
    ));
    assert!(buf.is_empty(), "nothing may be written on failure");
}

#[test]
fn test_length_bounds_are_enforced() {
    // Ping is fixed-size 12; an 11-byte payload violates min_size.
    let mut buf = BytesMut::new();
    let err = encode_frame(&mut buf, PING_ID, &[0u8; 11], &NoCompression)
        .expect_err("expected failure");
    assert!(matches!(
        err,
        FrameError::Decode(DecodeError::BadLength { len: 11, min: 12, max: 12 })
    ));

    // Decode side: forge a frame with a 13-byte Ping payload.
    let mut forged = BytesMut::new();
    forged.extend_from_slice(&[PING_ID as u8, 13]);
    forged.extend_from_slice(&[0u8; 13]);
    let frozen = forged.freeze();
    let mut cur = Cursor::new(frozen.as_ref());
    let err = decode_frame(&mut cur, &NoCompression).expect_err("expected failure");
    assert!(matches!(
        err,
        FrameError::Decode(DecodeError::BadLength { len: 13, .. })
    ));
}

#[test]
fn test_truncated_frame_is_incomplete() {
    let mut forged = BytesMut::new();
    forged.extend_from_slice(&[PING_ID as u8, 12]);
    forged.extend_from_slice(&[0u8; 5]);
    let frozen = forged.freeze();
    let mut cur = Cursor::new(frozen.as_ref());
    let err = decode_frame(&mut cur, &NoCompression).expect_err("expected failure");
    assert!(matches!(
        err,
        FrameError::Decode(DecodeError::Incomplete)
    ));
}
