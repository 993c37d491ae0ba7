// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Trail and particle packets (ids 48–50).
//!
//! `UpdateParticleSystems`/`UpdateParticleEmitters` carry two top-level
//! variable fields (the dictionary and a removed-names array), so their
//! envelope uses an offset table instead of the inline layout.

use std::{collections::BTreeMap, io::Cursor};

use bytes::{Buf, BufMut, BytesMut};

use crate::{
    assets::{
        AssetPacket,
        update::{
            OffsetTable, OffsetView, UpdateType, nullbit, pack_nullbits,
            read_codec_dict, string_keyed_packet, write_codec_dict,
        },
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
        varint::{get_varint, put_varint},
    },
};

/// Ribbon trail rendered behind fast-moving entities and projectiles.
///
/// The fixed block is 61 bytes (nullability byte included); the id and
/// texture strings live behind a two-slot entry-local offset table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    pub width_start: f32,
    pub width_end: f32,
    pub alpha_start: f32,
    pub alpha_end: f32,
    pub lifetime: f32,
    pub segment_length: f32,
    pub emission_rate: f32,
    pub gravity: f32,
    pub drag: f32,
    pub noise_amplitude: f32,
    pub noise_frequency: f32,
    pub scroll_speed: f32,
    pub brightness: f32,
    pub color: u32,
    pub max_segments: u16,
    pub additive: bool,
    pub blend_mode: u8,
    pub id: Option<String>,
    pub texture: Option<String>,
}

impl HytaleCodec for Trail {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.id.is_some(), self.texture.is_some()]));
        for value in [
            self.width_start,
            self.width_end,
            self.alpha_start,
            self.alpha_end,
            self.lifetime,
            self.segment_length,
            self.emission_rate,
            self.gravity,
            self.drag,
            self.noise_amplitude,
            self.noise_frequency,
            self.scroll_speed,
            self.brightness,
        ] {
            value.encode(buf)?;
        }
        self.color.encode(buf)?;
        self.max_segments.encode(buf)?;
        self.additive.encode(buf)?;
        self.blend_mode.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(id) = &self.id {
            table.mark(buf, 0)?;
            id.encode(buf)?;
        }
        if let Some(texture) = &self.texture {
            table.mark(buf, 1)?;
            texture.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let mut floats = [0f32; 13];
        for value in &mut floats {
            *value = f32::decode(cur)?;
        }
        let color = u32::decode(cur)?;
        let max_segments = u16::decode(cur)?;
        let additive = bool::decode(cur)?;
        let blend_mode = u8::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let id = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let texture = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let [width_start, width_end, alpha_start, alpha_end, lifetime, segment_length, emission_rate, gravity, drag, noise_amplitude, noise_frequency, scroll_speed, brightness] =
            floats;
        Ok(Self {
            width_start,
            width_end,
            alpha_start,
            alpha_end,
            lifetime,
            segment_length,
            emission_rate,
            gravity,
            drag,
            noise_amplitude,
            noise_frequency,
            scroll_speed,
            brightness,
            color,
            max_segments,
            additive,
            blend_mode,
            id,
            texture,
        })
    }
}

string_keyed_packet! {
    UpdateTrails, id = 48, trails: Trail, max_size = 1_048_576
}

/// Writes a varint-counted array of varstrings.
fn write_name_array(buf: &mut BytesMut, names: &[String]) -> Result<(), EncodeError> {
    put_varint(buf, names.len() as u32);
    for name in names {
        name.encode(buf)?;
    }
    Ok(())
}

fn read_name_array(cur: &mut Cursor<&[u8]>) -> Result<Vec<String>, DecodeError> {
    let count = get_varint(cur)?;
    let mut names = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        names.push(String::decode(cur)?);
    }
    Ok(names)
}

/// Emits the shared two-slot envelope of the dictionary + removed-names
/// packets (49, 50, 54, 78, 85 all share this tail shape).
pub(crate) fn write_dict_and_removed<E: HytaleCodec>(
    buf: &mut BytesMut,
    update: UpdateType,
    extra_fixed: &[u8],
    dict: Option<&BTreeMap<String, E>>,
    removed: Option<&Vec<String>>,
) -> Result<(), EncodeError> {
    buf.put_u8(pack_nullbits(&[dict.is_some(), removed.is_some()]));
    update.encode(buf)?;
    buf.put_slice(extra_fixed);
    let table = OffsetTable::reserve(buf, 2);
    if let Some(dict) = dict {
        table.mark(buf, 0)?;
        write_codec_dict(buf, dict)?;
    }
    if let Some(removed) = removed {
        table.mark(buf, 1)?;
        write_name_array(buf, removed)?;
    }
    Ok(())
}

/// Counterpart of [`write_dict_and_removed`].
#[allow(clippy::type_complexity)]
pub(crate) fn read_dict_and_removed<E: HytaleCodec>(
    cur: &mut Cursor<&[u8]>,
    extra_fixed: &mut [u8],
) -> Result<(UpdateType, Option<BTreeMap<String, E>>, Option<Vec<String>>), DecodeError> {
    if !cur.has_remaining() {
        return Err(DecodeError::Incomplete);
    }
    let bits = cur.get_u8();
    let update = UpdateType::decode(cur)?;
    if cur.remaining() < extra_fixed.len() {
        return Err(DecodeError::Incomplete);
    }
    cur.copy_to_slice(extra_fixed);
    let view = OffsetView::read(cur, 2)?;
    let dict = if nullbit(bits, 0) && view.seek(cur, 0)? {
        Some(read_codec_dict(cur)?)
    } else {
        None
    };
    let removed = if nullbit(bits, 1) && view.seek(cur, 1)? {
        Some(read_name_array(cur)?)
    } else {
        None
    };
    Ok((update, dict, removed))
}

/// Particle system definition; id and material behind a two-slot
/// entry-local table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystem {
    pub max_particles: u32,
    pub lifetime: f32,
    pub looping: bool,
    pub id: Option<String>,
    pub material: Option<String>,
}

impl HytaleCodec for ParticleSystem {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.id.is_some(), self.material.is_some()]));
        self.max_particles.encode(buf)?;
        self.lifetime.encode(buf)?;
        self.looping.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(id) = &self.id {
            table.mark(buf, 0)?;
            id.encode(buf)?;
        }
        if let Some(material) = &self.material {
            table.mark(buf, 1)?;
            material.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let max_particles = u32::decode(cur)?;
        let lifetime = f32::decode(cur)?;
        let looping = bool::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let id = if nullbit(bits, 0) && view.seek(cur, 0)? {
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
            max_particles,
            lifetime,
            looping,
            id,
            material,
        })
    }
}

/// Particle system sync plus the names retired since the last sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateParticleSystems {
    pub update: UpdateType,
    pub systems: Option<BTreeMap<String, ParticleSystem>>,
    pub removed: Option<Vec<String>>,
}

impl AssetPacket for UpdateParticleSystems {
    const PACKET_ID: u32 = 49;
    const FIXED_BLOCK_SIZE: usize = 1;
    const VARIABLE_FIELD_COUNT: usize = 2;
    const USES_OFFSET_TABLE: bool = true;
    const MAX_SIZE: usize = 4_194_304;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_dict_and_removed(
            buf,
            self.update,
            &[],
            self.systems.as_ref(),
            self.removed.as_ref(),
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, systems, removed) = read_dict_and_removed(cur, &mut [])?;
        Ok(Self {
            update,
            systems,
            removed,
        })
    }
}

/// Emitter attached to a particle system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleEmitter {
    pub rate: f32,
    pub burst: u16,
    pub shape: u8,
    pub id: Option<String>,
    pub system: Option<String>,
}

impl HytaleCodec for ParticleEmitter {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.id.is_some(), self.system.is_some()]));
        self.rate.encode(buf)?;
        self.burst.encode(buf)?;
        self.shape.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(id) = &self.id {
            table.mark(buf, 0)?;
            id.encode(buf)?;
        }
        if let Some(system) = &self.system {
            table.mark(buf, 1)?;
            system.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let rate = f32::decode(cur)?;
        let burst = u16::decode(cur)?;
        let shape = u8::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let id = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let system = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        Ok(Self {
            rate,
            burst,
            shape,
            id,
            system,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateParticleEmitters {
    pub update: UpdateType,
    pub emitters: Option<BTreeMap<String, ParticleEmitter>>,
    pub removed: Option<Vec<String>>,
}

impl AssetPacket for UpdateParticleEmitters {
    const PACKET_ID: u32 = 50;
    const FIXED_BLOCK_SIZE: usize = 1;
    const VARIABLE_FIELD_COUNT: usize = 2;
    const USES_OFFSET_TABLE: bool = true;
    const MAX_SIZE: usize = 2_097_152;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_dict_and_removed(
            buf,
            self.update,
            &[],
            self.emitters.as_ref(),
            self.removed.as_ref(),
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, emitters, removed) = read_dict_and_removed(cur, &mut [])?;
        Ok(Self {
            update,
            emitters,
            removed,
        })
    }
}
