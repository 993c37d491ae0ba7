// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Fluid and foliage definition packets (ids 45–46).

use std::io::Cursor;

use bytes::{BufMut, BytesMut};

use crate::{
    assets::update::{
        flat_codec, int_keyed_packet, nullbit, pack_nullbits, read_inline_opt_string,
        write_inline_opt_string,
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Fluid simulation parameters; the optional surface texture id trails
/// the fixed block inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fluid {
    pub viscosity: f32,
    pub density: f32,
    pub swimmable: bool,
    pub surface_texture: Option<String>,
}

impl HytaleCodec for Fluid {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.surface_texture.is_some()]));
        self.viscosity.encode(buf)?;
        self.density.encode(buf)?;
        self.swimmable.encode(buf)?;
        write_inline_opt_string(buf, self.surface_texture.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let viscosity = f32::decode(cur)?;
        let density = f32::decode(cur)?;
        let swimmable = bool::decode(cur)?;
        let surface_texture = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            viscosity,
            density,
            swimmable,
            surface_texture,
        })
    }
}

int_keyed_packet! {
    UpdateFluids, id = 45, fluids: Fluid, max_size = 524_288
}

flat_codec! {
    /// Wind response of grass/leaf geometry.
    pub struct FoliageConfig {
        pub sway_strength: f32,
        pub sway_speed: f32,
        pub align_to_ground: bool,
    }
}

int_keyed_packet! {
    UpdateFoliageConfigs, id = 46, configs: FoliageConfig, max_size = 524_288
}
