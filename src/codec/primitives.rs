// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The [`HytaleCodec`] trait plus implementations for every scalar the
//! packet bodies are built from.
//!
//! All multi-byte scalars are little-endian. Strings travel as a varint
//! byte length followed by UTF-8 with no trailing NUL; UUIDs travel as
//! 16 raw bytes (big-endian field order, as rendered by their canonical
//! text form).

use std::io::Cursor;

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use crate::codec::{
    error::{DecodeError, EncodeError},
    varint::{get_varint, put_varint},
};

/// Byte length cap for a single varstring / byte array (31-bit offsets
/// must stay representable past it).
pub const MAX_VAR_LEN: usize = i32::MAX as usize;

/// Symmetric encode/decode over the Hytale wire layout.
pub trait HytaleCodec: Sized {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError>;
    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError>;
}

macro_rules! scalar_codec {
    ($($ty:ty => $put:ident, $get:ident, $width:literal;)*) => {$(
        impl HytaleCodec for $ty {
            #[inline]
            fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
                buf.$put(*self);
                Ok(())
            }

            #[inline]
            fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
                if cur.remaining() < $width {
                    return Err(DecodeError::Incomplete);
                }
                Ok(cur.$get())
            }
        }
    )*};
}

scalar_codec! {
    u8 => put_u8, get_u8, 1;
    i8 => put_i8, get_i8, 1;
    u16 => put_u16_le, get_u16_le, 2;
    i16 => put_i16_le, get_i16_le, 2;
    u32 => put_u32_le, get_u32_le, 4;
    i32 => put_i32_le, get_i32_le, 4;
    u64 => put_u64_le, get_u64_le, 8;
    i64 => put_i64_le, get_i64_le, 8;
    f32 => put_f32_le, get_f32_le, 4;
    f64 => put_f64_le, get_f64_le, 8;
}

impl HytaleCodec for bool {
    #[inline]
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(u8::from(*self));
        Ok(())
    }

    #[inline]
    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if !cur.has_remaining() {
            return Err(DecodeError::Incomplete);
        }
        Ok(cur.get_u8() != 0)
    }
}

impl HytaleCodec for String {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let bytes = self.as_bytes();
        if bytes.len() > MAX_VAR_LEN {
            return Err(EncodeError::Overflow(bytes.len()));
        }
        put_varint(buf, bytes.len() as u32);
        buf.put_slice(bytes);
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let len = get_varint(cur)? as usize;
        if cur.remaining() < len {
            return Err(DecodeError::Incomplete);
        }
        let mut raw = vec![0u8; len];
        cur.copy_to_slice(&mut raw);
        String::from_utf8(raw).map_err(|_| DecodeError::Utf8)
    }
}

impl HytaleCodec for Vec<u8> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        if self.len() > MAX_VAR_LEN {
            return Err(EncodeError::Overflow(self.len()));
        }
        put_varint(buf, self.len() as u32);
        buf.put_slice(self);
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let len = get_varint(cur)? as usize;
        if cur.remaining() < len {
            return Err(DecodeError::Incomplete);
        }
        let mut raw = vec![0u8; len];
        cur.copy_to_slice(&mut raw);
        Ok(raw)
    }
}

impl HytaleCodec for Uuid {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_slice(self.as_bytes());
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if cur.remaining() < 16 {
            return Err(DecodeError::Incomplete);
        }
        let mut raw = [0u8; 16];
        cur.copy_to_slice(&mut raw);
        Ok(Uuid::from_bytes(raw))
    }
}

/// Parses a UUID from either the 32-hex or the 36-char dashed text form.
pub fn parse_uuid(text: &str) -> Option<Uuid> {
    if text.len() != 32 && text.len() != 36 {
        return None;
    }
    Uuid::parse_str(text).ok()
}

/// Canonical dashed-hex rendering.
pub fn format_uuid(uuid: &Uuid) -> String {
    uuid.hyphenated().to_string()
}
