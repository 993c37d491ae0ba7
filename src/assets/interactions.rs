// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Interaction packets (ids 67–69).
//!
//! `UpdateUnarmedInteractions` is the one dictionary in the family keyed
//! by a 1-byte enum rather than an int or a varstring.

use std::{collections::BTreeMap, io::Cursor};

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    assets::{
        AssetPacket,
        update::{
            UpdateType, flat_codec, int_keyed_packet, nullbit, pack_nullbits,
            read_codec_dict, read_inline_opt_string, string_keyed_packet,
            write_codec_dict, write_inline_opt_string,
        },
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Which hand/intent slot an unarmed interaction binds to.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InteractionType {
    #[default]
    Primary = 0,
    Secondary = 1,
    Use = 2,
    Pick = 3,
}

impl HytaleCodec for InteractionType {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(*self as u8);
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if !cur.has_remaining() {
            return Err(DecodeError::Incomplete);
        }
        match cur.get_u8() {
            0 => Ok(Self::Primary),
            1 => Ok(Self::Secondary),
            2 => Ok(Self::Use),
            3 => Ok(Self::Pick),
            value => Err(DecodeError::InvalidEnum {
                what: "InteractionType",
                value,
            }),
        }
    }
}

/// Interaction an item grants while held.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInteraction {
    pub cooldown: f32,
    pub range: f32,
    pub animation: Option<String>,
}

impl HytaleCodec for ItemInteraction {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.animation.is_some()]));
        self.cooldown.encode(buf)?;
        self.range.encode(buf)?;
        write_inline_opt_string(buf, self.animation.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let cooldown = f32::decode(cur)?;
        let range = f32::decode(cur)?;
        let animation = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            cooldown,
            range,
            animation,
        })
    }
}

string_keyed_packet! {
    UpdateItemInteractions, id = 67, interactions: ItemInteraction, max_size = 1_048_576
}

/// Bare-handed interaction parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnarmedInteraction {
    pub cooldown: f32,
    pub range: f32,
    pub damage: f32,
    pub animation: Option<String>,
}

impl HytaleCodec for UnarmedInteraction {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.animation.is_some()]));
        self.cooldown.encode(buf)?;
        self.range.encode(buf)?;
        self.damage.encode(buf)?;
        write_inline_opt_string(buf, self.animation.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let cooldown = f32::decode(cur)?;
        let range = f32::decode(cur)?;
        let damage = f32::decode(cur)?;
        let animation = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            cooldown,
            range,
            damage,
            animation,
        })
    }
}

/// Unarmed interaction sync, keyed by [`InteractionType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateUnarmedInteractions {
    pub update: UpdateType,
    pub interactions: Option<BTreeMap<InteractionType, UnarmedInteraction>>,
}

impl AssetPacket for UpdateUnarmedInteractions {
    const PACKET_ID: u32 = 68;
    const FIXED_BLOCK_SIZE: usize = 1;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 262_144;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.interactions.is_some()]));
        self.update.encode(buf)?;
        if let Some(dict) = &self.interactions {
            write_codec_dict(buf, dict)?;
        }
        Ok(())
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let update = UpdateType::decode(cur)?;
        let interactions = if nullbit(bits, 0) {
            Some(read_codec_dict(cur)?)
        } else {
            None
        };
        Ok(Self {
            update,
            interactions,
        })
    }
}

flat_codec! {
    /// Interaction triggered by activating a block in place.
    pub struct BlockInteraction {
        pub action: u8,
        pub seconds: f32,
        pub requires_tool: bool,
    }
}

int_keyed_packet! {
    UpdateBlockInteractions, id = 69, interactions: BlockInteraction, max_size = 1_048_576
}
