// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Block definition packets: types, hitboxes, collision configs, sound
//! sets and block-break particles (ids 40–44).

use std::{collections::BTreeMap, io::Cursor};

use bytes::{Buf, BufMut, BytesMut};
use zerocopy::{
    F32, FromBytes as ZFromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian,
};

use crate::{
    assets::{
        AssetPacket,
        update::{
            OffsetTable, OffsetView, UpdateType, flat_codec, nullbit, pack_nullbits,
            read_inline_opt_string, read_int_keyed, write_inline_opt_string,
            write_int_keyed,
        },
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
        varint::{get_varint, put_varint},
    },
};

/// One block definition. Name and material live in an entry-local
/// variable region behind a two-slot offset table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockType {
    pub draw_type: u8,
    pub light_emission: u8,
    pub hardness: f32,
    pub solid: bool,
    pub name: Option<String>,
    pub material: Option<String>,
}

impl HytaleCodec for BlockType {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[
            self.name.is_some(),
            self.material.is_some(),
        ]));
        self.draw_type.encode(buf)?;
        self.light_emission.encode(buf)?;
        self.hardness.encode(buf)?;
        self.solid.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(name) = &self.name {
            table.mark(buf, 0)?;
            name.encode(buf)?;
        }
        if let Some(material) = &self.material {
            table.mark(buf, 1)?;
            material.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let draw_type = u8::decode(cur)?;
        let light_emission = u8::decode(cur)?;
        let hardness = f32::decode(cur)?;
        let solid = bool::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let name = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let material = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        Ok(Self {
            draw_type,
            light_emission,
            hardness,
            solid,
            name,
            material,
        })
    }
}

/// Full block-type sync. The four flags tell the client which derived
/// caches to rebuild after applying the dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBlockTypes {
    pub update: UpdateType,
    pub max_id: u32,
    pub update_geometry: bool,
    pub update_textures: bool,
    pub update_lods: bool,
    pub clear_cached_shapes: bool,
    pub block_types: Option<BTreeMap<u32, BlockType>>,
}

impl AssetPacket for UpdateBlockTypes {
    const PACKET_ID: u32 = 40;
    const FIXED_BLOCK_SIZE: usize = 9;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 4_194_304;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let extra = [
            u8::from(self.update_geometry),
            u8::from(self.update_textures),
            u8::from(self.update_lods),
            u8::from(self.clear_cached_shapes),
        ];
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &extra,
            self.block_types.as_ref(),
            BlockType::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let mut extra = [0u8; 4];
        let (update, max_id, block_types) =
            read_int_keyed(cur, &mut extra, BlockType::decode)?;
        Ok(Self {
            update,
            max_id,
            update_geometry: extra[0] != 0,
            update_textures: extra[1] != 0,
            update_lods: extra[2] != 0,
            clear_cached_shapes: extra[3] != 0,
            block_types,
        })
    }
}

/// Axis-aligned box, 24 bytes on the wire.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, ZFromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Hitbox {
    pub min: [F32<LittleEndian>; 3],
    pub max: [F32<LittleEndian>; 3],
}

pub const HITBOX_LEN: usize = 24;

impl Hitbox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            min: min.map(F32::new),
            max: max.map(F32::new),
        }
    }
}

impl HytaleCodec for Hitbox {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_slice(self.as_bytes());
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        if cur.remaining() < HITBOX_LEN {
            return Err(DecodeError::Incomplete);
        }
        let mut raw = [0u8; HITBOX_LEN];
        cur.copy_to_slice(&mut raw);
        Hitbox::read_from_bytes(&raw).map_err(|_| DecodeError::Incomplete)
    }
}

/// Per-block hitbox list: varint count then packed 24-byte boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockHitboxes {
    pub boxes: Vec<Hitbox>,
}

impl HytaleCodec for BlockHitboxes {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        put_varint(buf, self.boxes.len() as u32);
        for hitbox in &self.boxes {
            hitbox.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let count = get_varint(cur)?;
        let mut boxes = Vec::with_capacity(count.min(4096) as usize);
        for _ in 0..count {
            boxes.push(Hitbox::decode(cur)?);
        }
        Ok(Self { boxes })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBlockHitboxes {
    pub update: UpdateType,
    pub max_id: u32,
    pub hitboxes: Option<BTreeMap<u32, BlockHitboxes>>,
}

impl AssetPacket for UpdateBlockHitboxes {
    const PACKET_ID: u32 = 41;
    const FIXED_BLOCK_SIZE: usize = 5;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 1_048_576;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &[],
            self.hitboxes.as_ref(),
            BlockHitboxes::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, max_id, hitboxes) =
            read_int_keyed(cur, &mut [], BlockHitboxes::decode)?;
        Ok(Self {
            update,
            max_id,
            hitboxes,
        })
    }
}

flat_codec! {
    /// Five bytes per entry: how a hitbox participates in collision.
    pub struct HitboxCollisionConfig {
        pub collision_type: u8,
        pub mask: u16,
        pub layer: u8,
        pub trigger: bool,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateHitboxCollisionConfigs {
    pub update: UpdateType,
    pub max_id: u32,
    pub configs: Option<BTreeMap<u32, HitboxCollisionConfig>>,
}

impl AssetPacket for UpdateHitboxCollisionConfigs {
    const PACKET_ID: u32 = 42;
    const FIXED_BLOCK_SIZE: usize = 5;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 262_144;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &[],
            self.configs.as_ref(),
            HitboxCollisionConfig::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, max_id, configs) =
            read_int_keyed(cur, &mut [], HitboxCollisionConfig::decode)?;
        Ok(Self {
            update,
            max_id,
            configs,
        })
    }
}

/// Footstep/break/place sound binding for a block; the optional footstep
/// event id trails the fixed block inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSoundSet {
    pub volume: f32,
    pub pitch: f32,
    pub footstep_event: Option<String>,
}

impl HytaleCodec for BlockSoundSet {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.footstep_event.is_some()]));
        self.volume.encode(buf)?;
        self.pitch.encode(buf)?;
        write_inline_opt_string(buf, self.footstep_event.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let volume = f32::decode(cur)?;
        let pitch = f32::decode(cur)?;
        let footstep_event = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            volume,
            pitch,
            footstep_event,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBlockSoundSets {
    pub update: UpdateType,
    pub max_id: u32,
    pub sound_sets: Option<BTreeMap<u32, BlockSoundSet>>,
}

impl AssetPacket for UpdateBlockSoundSets {
    const PACKET_ID: u32 = 43;
    const FIXED_BLOCK_SIZE: usize = 5;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 1_048_576;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &[],
            self.sound_sets.as_ref(),
            BlockSoundSet::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, max_id, sound_sets) =
            read_int_keyed(cur, &mut [], BlockSoundSet::decode)?;
        Ok(Self {
            update,
            max_id,
            sound_sets,
        })
    }
}

flat_codec! {
    /// Particle burst played on block break/step.
    pub struct BlockParticle {
        pub system_id: u32,
        pub density: f32,
        pub tint: u32,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBlockParticles {
    pub update: UpdateType,
    pub max_id: u32,
    pub particles: Option<BTreeMap<u32, BlockParticle>>,
}

impl AssetPacket for UpdateBlockParticles {
    const PACKET_ID: u32 = 44;
    const FIXED_BLOCK_SIZE: usize = 5;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 1_048_576;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &[],
            self.particles.as_ref(),
            BlockParticle::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, max_id, particles) =
            read_int_keyed(cur, &mut [], BlockParticle::decode)?;
        Ok(Self {
            update,
            max_id,
            particles,
        })
    }
}
