// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// Failures raised while encoding a packet body.
///
/// Encoders never recover locally: the first failure aborts the whole
/// encode and the output buffer must be discarded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A value does not fit the width the wire format gives it
    /// (offsets are signed 32-bit, varstrings carry a u32 length).
    #[error("value exceeds 31-bit offset range: {0}")]
    Overflow(usize),

    /// The encoded payload exceeds the packet's declared maximum size.
    #[error("encoded payload too large: {len} > {max}")]
    TooLarge { len: usize, max: usize },
}

/// Failures raised while decoding a packet body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before the field being read.
    #[error("buffer too short")]
    Incomplete,

    /// A varint ran past its maximum width or exceeds u32 range.
    #[error("malformed varint")]
    Varint,

    /// A varstring did not hold valid UTF-8.
    #[error("invalid utf-8 in varstring")]
    Utf8,

    /// A discriminant byte holds a value outside its enumeration.
    #[error("invalid {what} discriminant: 0x{value:02x}")]
    InvalidEnum { what: &'static str, value: u8 },

    /// An offset-table slot points outside the variable region.
    #[error("offset out of range: {0}")]
    BadOffset(i32),

    /// The payload length violates the registry bounds for the packet.
    #[error("payload length {len} outside declared bounds {min}..={max}")]
    BadLength { len: usize, min: usize, max: usize },

    /// The packet id is not known to the registry.
    #[error("unknown packet id: {0}")]
    UnknownPacket(u32),
}
