// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Frame-level codec: `{id: varint, length: varint, payload}`.
//!
//! The payload is the raw encoded packet when the registry descriptor says
//! `compressed = false`, or a Zstd stream otherwise. The Zstd codec itself
//! is a host concern and enters through the [`Compression`] trait; this
//! module only decides *whether* to invoke it and validates the
//! decompressed length against the registry bounds.

use std::io::Cursor;

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use crate::{
    codec::{
        error::DecodeError,
        varint::{get_varint, put_varint},
    },
    registry,
};

/// Host-supplied payload compression.
///
/// `decompress` receives the upper bound it may allocate for
/// (`max_size` from the packet descriptor) and must fail on any output
/// larger than that.
pub trait Compression {
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CompressionError>;
    fn decompress(&self, raw: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError>;
}

#[derive(Debug, Error)]
#[error("compression codec failure: {0}")]
pub struct CompressionError(pub String);

/// Pass-through codec for uncompressed links and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompression;

impl Compression for NoCompression {
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, raw: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError> {
        if raw.len() > max_size {
            return Err(CompressionError(format!(
                "payload {} exceeds bound {max_size}",
                raw.len()
            )));
        }
        Ok(raw.to_vec())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Compression(#[from] CompressionError),
}

/// A decoded frame: packet id plus the raw (decompressed) packet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u32,
    pub payload: Vec<u8>,
}

/// Encodes one frame, compressing the payload when the registry marks the
/// packet compressed. Unknown ids are rejected before any bytes are
/// written.
pub fn encode_frame(
    buf: &mut BytesMut,
    id: u32,
    payload: &[u8],
    codec: &dyn Compression,
) -> Result<(), FrameError> {
    let desc = registry::lookup(id).ok_or(DecodeError::UnknownPacket(id))?;
    check_bounds(payload.len(), desc)?;

    if desc.compressed {
        let packed = codec.compress(payload)?;
        put_varint(buf, id);
        put_varint(buf, packed.len() as u32);
        buf.put_slice(&packed);
    } else {
        put_varint(buf, id);
        put_varint(buf, payload.len() as u32);
        buf.put_slice(payload);
    }
    Ok(())
}

/// Decodes one frame off the cursor, decompressing and length-checking the
/// payload against the packet descriptor.
pub fn decode_frame(
    cur: &mut Cursor<&[u8]>,
    codec: &dyn Compression,
) -> Result<Frame, FrameError> {
    let id = get_varint(cur)?;
    let len = get_varint(cur)? as usize;

    let pos = cur.position() as usize;
    let body = cur
        .get_ref()
        .get(pos..pos + len)
        .ok_or(DecodeError::Incomplete)?;
    cur.set_position((pos + len) as u64);

    let desc = registry::lookup(id).ok_or(DecodeError::UnknownPacket(id))?;
    let payload = if desc.compressed {
        codec.decompress(body, desc.max_size as usize)?
    } else {
        body.to_vec()
    };
    check_bounds(payload.len(), desc)?;

    Ok(Frame { id, payload })
}

fn check_bounds(len: usize, desc: &registry::PacketDescriptor) -> Result<(), DecodeError> {
    let (min, max) = (desc.min_size as usize, desc.max_size as usize);
    if len < min || len > max {
        return Err(DecodeError::BadLength { len, min, max });
    }
    Ok(())
}
