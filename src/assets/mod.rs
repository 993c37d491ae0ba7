// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The asset-update packet family (ids 40–85).
//!
//! Each packet type pins its wire shape through associated constants and
//! encodes/decodes its body through the shared envelope helpers in
//! [`update`]. All asset packets travel compressed.

use std::io::Cursor;

use bytes::{Bytes, BytesMut};

use crate::codec::error::{DecodeError, EncodeError};

/// Audio: sound events, music, categories, reverb/equalizer, ambience.
pub mod audio;
/// Block types, hitboxes, collision configs, sound sets, block particles.
pub mod blocks;
/// Camera shakes and profiles.
pub mod camera;
/// Entity effects, status effects, entity animations.
pub mod effects;
/// Weathers, environments, skyboxes, cloud layers, day cycles.
pub mod environment;
/// Emotes, decals, crosshairs, markers, nameplates, HUD, input bindings.
pub mod hud;
/// Item, recipe, loot and harvestable definitions.
pub mod items;
/// Item, unarmed and block interactions.
pub mod interactions;
/// Trails, particle systems and emitters.
pub mod particles;
/// Projectile configs.
pub mod projectiles;
/// Tag pattern operand trees.
pub mod tags;
/// Fluids and foliage.
pub mod terrain;
/// Envelope machinery shared by the family.
pub mod update;
/// Decode-by-id dispatcher over the whole family.
pub mod parse;

/// Compile-time wire shape plus body codec of one asset packet.
pub trait AssetPacket: Sized {
    const PACKET_ID: u32;
    const IS_COMPRESSED: bool = true;
    const NULLABLE_BIT_FIELD_SIZE: usize = 1;
    /// Type byte, optional `max_id`, and packet-specific scalars; excludes
    /// the nullability byte and any offset table.
    const FIXED_BLOCK_SIZE: usize;
    const VARIABLE_FIELD_COUNT: usize;
    /// Whether top-level variable fields go through an offset table
    /// (single-field packets append inline instead).
    const USES_OFFSET_TABLE: bool = false;
    /// Upper bound on the encoded body; encode fails `TooLarge` past it.
    const MAX_SIZE: usize;

    /// Byte offset where the variable region begins.
    const VARIABLE_BLOCK_START: usize = Self::NULLABLE_BIT_FIELD_SIZE
        + Self::FIXED_BLOCK_SIZE
        + if Self::USES_OFFSET_TABLE {
            4 * Self::VARIABLE_FIELD_COUNT
        } else {
            0
        };

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError>;
    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError>;

    /// Encodes the whole body and enforces [`Self::MAX_SIZE`].
    fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::new();
        self.encode_payload(&mut buf)?;
        if buf.len() > Self::MAX_SIZE {
            return Err(EncodeError::TooLarge {
                len: buf.len(),
                max: Self::MAX_SIZE,
            });
        }
        Ok(buf.freeze())
    }

    /// Decodes a whole body.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = Cursor::new(bytes);
        Self::decode_payload(&mut cur)
    }
}
