// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Atmosphere packets: weathers, environments, skyboxes, cloud layers
//! and day cycles (ids 47, 61–64).

use std::{collections::BTreeMap, io::Cursor};

use bytes::{BufMut, BytesMut};

use crate::{
    assets::{
        AssetPacket,
        update::{
            OffsetTable, OffsetView, UpdateType, flat_codec, int_keyed_packet,
            nullbit, pack_nullbits, read_inline_opt_string, read_int_keyed,
            string_keyed_packet, write_inline_opt_string, write_int_keyed,
        },
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Weather preset. The optional id string trails the 17-byte fixed
/// block inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weather {
    pub fog_density: f32,
    pub fog_color: u32,
    pub cloud_coverage: f32,
    pub rain_intensity: f32,
    pub lightning: bool,
    pub id: Option<String>,
}

impl HytaleCodec for Weather {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.id.is_some()]));
        self.fog_density.encode(buf)?;
        self.fog_color.encode(buf)?;
        self.cloud_coverage.encode(buf)?;
        self.rain_intensity.encode(buf)?;
        self.lightning.encode(buf)?;
        write_inline_opt_string(buf, self.id.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let fog_density = f32::decode(cur)?;
        let fog_color = u32::decode(cur)?;
        let cloud_coverage = f32::decode(cur)?;
        let rain_intensity = f32::decode(cur)?;
        let lightning = bool::decode(cur)?;
        let id = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            fog_density,
            fog_color,
            cloud_coverage,
            rain_intensity,
            lightning,
            id,
        })
    }
}

int_keyed_packet! {
    UpdateWeathers, id = 47, weathers: Weather, max_size = 524_288
}

/// Environment preset: ambient lighting plus three entry-local variable
/// strings behind a per-entry offset table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub ambient_color: u32,
    pub sun_intensity: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub id: Option<String>,
    pub skybox: Option<String>,
    pub ambient_loop: Option<String>,
}

impl HytaleCodec for Environment {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[
            self.id.is_some(),
            self.skybox.is_some(),
            self.ambient_loop.is_some(),
        ]));
        self.ambient_color.encode(buf)?;
        self.sun_intensity.encode(buf)?;
        self.fog_near.encode(buf)?;
        self.fog_far.encode(buf)?;
        let table = OffsetTable::reserve(buf, 3);
        for (slot, field) in [&self.id, &self.skybox, &self.ambient_loop]
            .into_iter()
            .enumerate()
        {
            if let Some(value) = field {
                table.mark(buf, slot)?;
                value.encode(buf)?;
            }
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let ambient_color = u32::decode(cur)?;
        let sun_intensity = f32::decode(cur)?;
        let fog_near = f32::decode(cur)?;
        let fog_far = f32::decode(cur)?;
        let view = OffsetView::read(cur, 3)?;
        let mut fields = [None, None, None];
        for (slot, value) in fields.iter_mut().enumerate() {
            if nullbit(bits, slot) && view.seek(cur, slot)? {
                *value = Some(String::decode(cur)?);
            }
        }
        let [id, skybox, ambient_loop] = fields;
        Ok(Self {
            ambient_color,
            sun_intensity,
            fog_near,
            fog_far,
            id,
            skybox,
            ambient_loop,
        })
    }
}

/// Environment sync; `rebuild_map_geometry` asks the client to rebake
/// map lighting after applying the dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateEnvironments {
    pub update: UpdateType,
    pub max_id: u32,
    pub rebuild_map_geometry: bool,
    pub environments: Option<BTreeMap<u32, Environment>>,
}

impl AssetPacket for UpdateEnvironments {
    const PACKET_ID: u32 = 61;
    const FIXED_BLOCK_SIZE: usize = 6;
    const VARIABLE_FIELD_COUNT: usize = 1;
    const MAX_SIZE: usize = 1_048_576;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_int_keyed(
            buf,
            self.update,
            self.max_id,
            &[u8::from(self.rebuild_map_geometry)],
            self.environments.as_ref(),
            Environment::encode,
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let mut extra = [0u8; 1];
        let (update, max_id, environments) =
            read_int_keyed(cur, &mut extra, Environment::decode)?;
        Ok(Self {
            update,
            max_id,
            rebuild_map_geometry: extra[0] != 0,
            environments,
        })
    }
}

/// Skybox preset; optional cubemap texture id inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skybox {
    pub rotation_speed: f32,
    pub brightness: f32,
    pub texture: Option<String>,
}

impl HytaleCodec for Skybox {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.texture.is_some()]));
        self.rotation_speed.encode(buf)?;
        self.brightness.encode(buf)?;
        write_inline_opt_string(buf, self.texture.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let rotation_speed = f32::decode(cur)?;
        let brightness = f32::decode(cur)?;
        let texture = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            rotation_speed,
            brightness,
            texture,
        })
    }
}

string_keyed_packet! {
    UpdateSkyboxes, id = 62, skyboxes: Skybox, max_size = 524_288
}

flat_codec! {
    pub struct CloudLayer {
        pub altitude: f32,
        pub speed: f32,
        pub coverage: f32,
        pub tint: u32,
    }
}

int_keyed_packet! {
    UpdateCloudLayers, id = 63, layers: CloudLayer, max_size = 262_144
}

flat_codec! {
    /// Day/night cycle timing, all in seconds of real time.
    pub struct DayCycle {
        pub day_length: f32,
        pub dawn_start: f32,
        pub dusk_start: f32,
        pub moon_phase_count: u8,
    }
}

int_keyed_packet! {
    UpdateDayCycles, id = 64, cycles: DayCycle, max_size = 262_144
}
