// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! HUD and screen-space packets (ids 70–77).

use std::io::Cursor;

use bytes::{BufMut, BytesMut};

use crate::{
    assets::update::{
        flat_codec, int_keyed_packet, nullbit, pack_nullbits, read_inline_opt_string,
        string_keyed_packet, write_inline_opt_string,
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
        varint::{get_varint, put_varint},
    },
};

/// Player emote clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emote {
    pub duration: f32,
    pub looping: bool,
    pub animation: Option<String>,
}

impl HytaleCodec for Emote {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.animation.is_some()]));
        self.duration.encode(buf)?;
        self.looping.encode(buf)?;
        write_inline_opt_string(buf, self.animation.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let duration = f32::decode(cur)?;
        let looping = bool::decode(cur)?;
        let animation = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            duration,
            looping,
            animation,
        })
    }
}

string_keyed_packet! {
    UpdateEmotes, id = 70, emotes: Emote, max_size = 524_288
}

flat_codec! {
    /// Surface decal (bullet hole, scorch mark, paint splat).
    pub struct Decal {
        pub size: f32,
        pub lifetime: f32,
        pub fade_seconds: f32,
        pub tint: u32,
    }
}

string_keyed_packet! {
    UpdateDecals, id = 71, decals: Decal, max_size = 524_288
}

flat_codec! {
    pub struct Crosshair {
        pub texture_index: u16,
        pub size: f32,
        pub spread_scale: f32,
    }
}

int_keyed_packet! {
    UpdateCrosshairs, id = 72, crosshairs: Crosshair, max_size = 131_072
}

/// World-map marker style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapMarker {
    pub color: u32,
    pub sort_order: u16,
    pub icon: Option<String>,
}

impl HytaleCodec for MapMarker {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.icon.is_some()]));
        self.color.encode(buf)?;
        self.sort_order.encode(buf)?;
        write_inline_opt_string(buf, self.icon.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let color = u32::decode(cur)?;
        let sort_order = u16::decode(cur)?;
        let icon = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            color,
            sort_order,
            icon,
        })
    }
}

string_keyed_packet! {
    UpdateMapMarkers, id = 73, markers: MapMarker, max_size = 524_288
}

flat_codec! {
    /// Floating name tag rendering rules.
    pub struct Nameplate {
        pub offset_y: f32,
        pub scale: f32,
        pub show_health: bool,
        pub show_distance: bool,
    }
}

int_keyed_packet! {
    UpdateNameplates, id = 74, nameplates: Nameplate, max_size = 131_072
}

flat_codec! {
    pub struct DamageIndicator {
        pub rise_speed: f32,
        pub lifetime: f32,
        pub crit_color: u32,
        pub normal_color: u32,
    }
}

int_keyed_packet! {
    UpdateDamageIndicators, id = 75, indicators: DamageIndicator, max_size = 131_072
}

flat_codec! {
    /// One anchored HUD element.
    pub struct HudAnchor {
        pub element: String,
        pub x: f32,
        pub y: f32,
        pub visible: bool,
    }
}

/// Named HUD arrangement: a varint-counted list of anchors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudLayout {
    pub anchors: Vec<HudAnchor>,
}

impl HytaleCodec for HudLayout {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        put_varint(buf, self.anchors.len() as u32);
        for anchor in &self.anchors {
            anchor.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let count = get_varint(cur)?;
        let mut anchors = Vec::with_capacity(count.min(256) as usize);
        for _ in 0..count {
            anchors.push(HudAnchor::decode(cur)?);
        }
        Ok(Self { anchors })
    }
}

string_keyed_packet! {
    UpdateHudLayouts, id = 76, layouts: HudLayout, max_size = 1_048_576
}

flat_codec! {
    /// Default key binding pushed by the server.
    pub struct InputBinding {
        pub key_code: u16,
        pub modifiers: u8,
        pub repeatable: bool,
    }
}

string_keyed_packet! {
    UpdateInputBindings, id = 77, bindings: InputBinding, max_size = 524_288
}
