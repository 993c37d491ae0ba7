// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared machinery for the asset-update packet family.
//!
//! Every asset packet body starts with a one-byte nullability bit field
//! (bit *i* ⇔ the *i*-th optional top-level field is present) and an
//! update-type byte, followed by a packet-specific fixed block. Packets
//! with a single variable field append it inline; packets with several
//! address them through a table of signed 32-bit little-endian offsets
//! measured from the end of the fixed block, −1 encoding "absent".
//!
//! Presence discipline: a dictionary that is *present but empty* sets its
//! nullability bit and writes `varint 0`; an *absent* dictionary clears
//! the bit and writes nothing (inline layout) or −1 (offset layout).
//! Clients observe the difference, so it survives round-trips.

use std::{collections::BTreeMap, io::Cursor};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{
    HytaleCodec,
    error::{DecodeError, EncodeError},
    varint::{get_varint, put_varint},
};

/// Kind of an asset update.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    #[default]
    Init = 0,
    Patch = 1,
    Remove = 2,
}

impl HytaleCodec for UpdateType {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(*self as u8);
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if !cur.has_remaining() {
            return Err(DecodeError::Incomplete);
        }
        match cur.get_u8() {
            0 => Ok(Self::Init),
            1 => Ok(Self::Patch),
            2 => Ok(Self::Remove),
            value => Err(DecodeError::InvalidEnum {
                what: "UpdateType",
                value,
            }),
        }
    }
}

/// Packs presence flags into the leading nullability byte, bit *i* for
/// field *i* in declared order.
pub fn pack_nullbits(present: &[bool]) -> u8 {
    present
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &p)| acc | (u8::from(p) << i))
}

#[inline]
pub fn nullbit(byte: u8, index: usize) -> bool {
    byte & (1 << index) != 0
}

/// Writes `varint count` plus `key, entry` pairs in key order.
///
/// Works for every key width the family uses: `u32` (4-byte LE), `String`
/// (varstring) and 1-byte enums, anything implementing [`HytaleCodec`].
pub fn write_dict<K, E>(
    buf: &mut BytesMut,
    dict: &BTreeMap<K, E>,
    mut write_entry: impl FnMut(&E, &mut BytesMut) -> Result<(), EncodeError>,
) -> Result<(), EncodeError>
where
    K: HytaleCodec + Ord,
{
    put_varint(buf, dict.len() as u32);
    for (key, entry) in dict {
        key.encode(buf)?;
        write_entry(entry, buf)?;
    }
    Ok(())
}

/// Reads a dictionary written by [`write_dict`].
pub fn read_dict<K, E>(
    cur: &mut Cursor<&[u8]>,
    mut read_entry: impl FnMut(&mut Cursor<&[u8]>) -> Result<E, DecodeError>,
) -> Result<BTreeMap<K, E>, DecodeError>
where
    K: HytaleCodec + Ord,
{
    let count = get_varint(cur)?;
    let mut dict = BTreeMap::new();
    for _ in 0..count {
        let key = K::decode(cur)?;
        let entry = read_entry(cur)?;
        dict.insert(key, entry);
    }
    Ok(dict)
}

/// [`write_dict`] for entry types that carry their own codec.
pub fn write_codec_dict<K, E>(
    buf: &mut BytesMut,
    dict: &BTreeMap<K, E>,
) -> Result<(), EncodeError>
where
    K: HytaleCodec + Ord,
    E: HytaleCodec,
{
    write_dict(buf, dict, E::encode)
}

/// [`read_dict`] for entry types that carry their own codec.
pub fn read_codec_dict<K, E>(
    cur: &mut Cursor<&[u8]>,
) -> Result<BTreeMap<K, E>, DecodeError>
where
    K: HytaleCodec + Ord,
    E: HytaleCodec,
{
    read_dict(cur, E::decode)
}

/// Reserved slots of an offset table, patched as variable fields land.
///
/// `reserve` fills every slot with −1 (absent); call [`Self::mark`] for a
/// slot immediately *before* writing its field so the recorded offset is
/// the field's start relative to the variable-block origin.
#[derive(Debug)]
pub struct OffsetTable {
    base: usize,
    slots: usize,
    var_start: usize,
}

impl OffsetTable {
    pub fn reserve(buf: &mut BytesMut, slots: usize) -> Self {
        let base = buf.len();
        for _ in 0..slots {
            buf.put_i32_le(-1);
        }
        Self {
            base,
            slots,
            var_start: buf.len(),
        }
    }

    /// Records the current write position as `slot`'s offset.
    pub fn mark(&self, buf: &mut BytesMut, slot: usize) -> Result<(), EncodeError> {
        debug_assert!(slot < self.slots);
        let off = buf.len() - self.var_start;
        if off > i32::MAX as usize {
            return Err(EncodeError::Overflow(off));
        }
        let pos = self.base + slot * 4;
        buf[pos..pos + 4].copy_from_slice(&(off as i32).to_le_bytes());
        Ok(())
    }
}

/// Read-side counterpart of [`OffsetTable`].
#[derive(Debug)]
pub struct OffsetView {
    offsets: Vec<i32>,
    var_start: u64,
}

impl OffsetView {
    pub fn read(cur: &mut Cursor<&[u8]>, slots: usize) -> Result<Self, DecodeError> {
        let mut offsets = Vec::with_capacity(slots);
        for _ in 0..slots {
            offsets.push(i32::decode(cur)?);
        }
        Ok(Self {
            offsets,
            var_start: cur.position(),
        })
    }

    /// True when `slot` holds a field. On presence the cursor is moved to
    /// the field's start.
    pub fn seek(&self, cur: &mut Cursor<&[u8]>, slot: usize) -> Result<bool, DecodeError> {
        let off = self.offsets[slot];
        if off < 0 {
            if off != -1 {
                return Err(DecodeError::BadOffset(off));
            }
            return Ok(false);
        }
        let target = self.var_start + off as u64;
        if target > cur.get_ref().len() as u64 {
            return Err(DecodeError::BadOffset(off));
        }
        cur.set_position(target);
        Ok(true)
    }

    /// Raw slot value, −1 for absent.
    pub fn offset(&self, slot: usize) -> i32 {
        self.offsets[slot]
    }
}

/// Appends the envelope of an int-keyed single-dictionary packet:
/// nullbits, type byte, 4-byte LE `max_id`, caller-encoded extra fixed
/// bytes, then the inline dictionary when present.
pub fn write_int_keyed<E>(
    buf: &mut BytesMut,
    update: UpdateType,
    max_id: u32,
    extra_fixed: &[u8],
    dict: Option<&BTreeMap<u32, E>>,
    write_entry: impl FnMut(&E, &mut BytesMut) -> Result<(), EncodeError>,
) -> Result<(), EncodeError> {
    buf.put_u8(pack_nullbits(&[dict.is_some()]));
    update.encode(buf)?;
    buf.put_u32_le(max_id);
    buf.put_slice(extra_fixed);
    if let Some(dict) = dict {
        write_dict(buf, dict, write_entry)?;
    }
    Ok(())
}

/// Decodes the [`write_int_keyed`] envelope; `extra_fixed` receives the
/// packet-specific fixed bytes verbatim.
pub fn read_int_keyed<E>(
    cur: &mut Cursor<&[u8]>,
    extra_fixed: &mut [u8],
    read_entry: impl FnMut(&mut Cursor<&[u8]>) -> Result<E, DecodeError>,
) -> Result<(UpdateType, u32, Option<BTreeMap<u32, E>>), DecodeError> {
    if !cur.has_remaining() {
        return Err(DecodeError::Incomplete);
    }
    let bits = cur.get_u8();
    let update = UpdateType::decode(cur)?;
    let max_id = u32::decode(cur)?;
    if cur.remaining() < extra_fixed.len() {
        return Err(DecodeError::Incomplete);
    }
    cur.copy_to_slice(extra_fixed);
    let dict = if nullbit(bits, 0) {
        Some(read_dict(cur, read_entry)?)
    } else {
        None
    };
    Ok((update, max_id, dict))
}

/// Appends the envelope of a string-keyed single-dictionary packet:
/// nullbits, type byte, then the inline dictionary when present.
pub fn write_string_keyed<E>(
    buf: &mut BytesMut,
    update: UpdateType,
    dict: Option<&BTreeMap<String, E>>,
    write_entry: impl FnMut(&E, &mut BytesMut) -> Result<(), EncodeError>,
) -> Result<(), EncodeError> {
    buf.put_u8(pack_nullbits(&[dict.is_some()]));
    update.encode(buf)?;
    if let Some(dict) = dict {
        write_dict(buf, dict, write_entry)?;
    }
    Ok(())
}

/// Decodes the [`write_string_keyed`] envelope.
pub fn read_string_keyed<E>(
    cur: &mut Cursor<&[u8]>,
    read_entry: impl FnMut(&mut Cursor<&[u8]>) -> Result<E, DecodeError>,
) -> Result<(UpdateType, Option<BTreeMap<String, E>>), DecodeError> {
    if !cur.has_remaining() {
        return Err(DecodeError::Incomplete);
    }
    let bits = cur.get_u8();
    let update = UpdateType::decode(cur)?;
    let dict = if nullbit(bits, 0) {
        Some(read_dict(cur, read_entry)?)
    } else {
        None
    };
    Ok((update, dict))
}

/// Smallest valid body of an int-keyed packet: a present-but-empty
/// dictionary (`[bits=1, type, max_id, extra…, varint 0]`).
pub fn empty_int_keyed(
    update: UpdateType,
    max_id: u32,
    extra_fixed: &[u8],
) -> Bytes {
    let mut buf = BytesMut::with_capacity(7 + extra_fixed.len());
    buf.put_u8(0x01);
    buf.put_u8(update as u8);
    buf.put_u32_le(max_id);
    buf.put_slice(extra_fixed);
    put_varint(&mut buf, 0);
    buf.freeze()
}

/// Smallest valid body of a string-keyed packet: `[bits=1, type, varint 0]`.
pub fn empty_string_keyed(update: UpdateType) -> Bytes {
    let mut buf = BytesMut::with_capacity(3);
    buf.put_u8(0x01);
    buf.put_u8(update as u8);
    put_varint(&mut buf, 0);
    buf.freeze()
}

/// Generates a plain wire struct plus its field-by-field [`HytaleCodec`].
///
/// Fields encode in declaration order with no per-entry nullability, the
/// flat-scalar-block entry shape.
macro_rules! flat_codec {
    ($(#[$meta:meta])* pub struct $name:ident {
        $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::codec::HytaleCodec for $name {
            fn encode(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::EncodeError> {
                $( self.$field.encode(buf)?; )*
                Ok(())
            }

            fn decode(
                cur: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::DecodeError> {
                Ok(Self {
                    $( $field: <$ty as $crate::codec::HytaleCodec>::decode(cur)?, )*
                })
            }
        }
    };
}

pub(crate) use flat_codec;

/// Generates an int-keyed single-dictionary packet: `update`, `max_id`
/// and one optional inline dictionary of `entry` values.
macro_rules! int_keyed_packet {
    ($(#[$meta:meta])* $name:ident, id = $id:literal,
     $field:ident : $entry:ty, max_size = $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub update: $crate::assets::update::UpdateType,
            pub max_id: u32,
            pub $field: Option<std::collections::BTreeMap<u32, $entry>>,
        }

        impl $crate::assets::AssetPacket for $name {
            const PACKET_ID: u32 = $id;
            const FIXED_BLOCK_SIZE: usize = 5;
            const VARIABLE_FIELD_COUNT: usize = 1;
            const MAX_SIZE: usize = $max;

            fn encode_payload(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::EncodeError> {
                $crate::assets::update::write_int_keyed(
                    buf,
                    self.update,
                    self.max_id,
                    &[],
                    self.$field.as_ref(),
                    <$entry as $crate::codec::HytaleCodec>::encode,
                )
            }

            fn decode_payload(
                cur: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::DecodeError> {
                let (update, max_id, $field) = $crate::assets::update::read_int_keyed(
                    cur,
                    &mut [],
                    <$entry as $crate::codec::HytaleCodec>::decode,
                )?;
                Ok(Self {
                    update,
                    max_id,
                    $field,
                })
            }
        }
    };
}

pub(crate) use int_keyed_packet;

/// Generates a string-keyed single-dictionary packet.
macro_rules! string_keyed_packet {
    ($(#[$meta:meta])* $name:ident, id = $id:literal,
     $field:ident : $entry:ty, max_size = $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub update: $crate::assets::update::UpdateType,
            pub $field: Option<std::collections::BTreeMap<String, $entry>>,
        }

        impl $crate::assets::AssetPacket for $name {
            const PACKET_ID: u32 = $id;
            const FIXED_BLOCK_SIZE: usize = 1;
            const VARIABLE_FIELD_COUNT: usize = 1;
            const MAX_SIZE: usize = $max;

            fn encode_payload(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::EncodeError> {
                $crate::assets::update::write_string_keyed(
                    buf,
                    self.update,
                    self.$field.as_ref(),
                    <$entry as $crate::codec::HytaleCodec>::encode,
                )
            }

            fn decode_payload(
                cur: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::DecodeError> {
                let (update, $field) = $crate::assets::update::read_string_keyed(
                    cur,
                    <$entry as $crate::codec::HytaleCodec>::decode,
                )?;
                Ok(Self { update, $field })
            }
        }
    };
}

pub(crate) use string_keyed_packet;

/// Encodes an optional varstring that trails a fixed block inline: the
/// caller has already recorded presence in the entry's nullability byte.
pub fn write_inline_opt_string(
    buf: &mut BytesMut,
    value: Option<&String>,
) -> Result<(), EncodeError> {
    if let Some(value) = value {
        value.encode(buf)?;
    }
    Ok(())
}

/// Counterpart of [`write_inline_opt_string`].
pub fn read_inline_opt_string(
    cur: &mut Cursor<&[u8]>,
    present: bool,
) -> Result<Option<String>, DecodeError> {
    if present {
        Ok(Some(String::decode(cur)?))
    } else {
        Ok(None)
    }
}
