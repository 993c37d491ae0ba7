// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Projectile config packets (id 85).

use std::{collections::BTreeMap, io::Cursor};

use bytes::{BufMut, BytesMut};

use crate::{
    assets::{
        AssetPacket,
        particles::{read_dict_and_removed, write_dict_and_removed},
        update::{OffsetTable, OffsetView, UpdateType, nullbit, pack_nullbits},
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Ballistics and impact parameters for one projectile type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub gravity: f32,
    pub lifetime: f32,
    pub damage: f32,
    pub pierce: u8,
    pub bounce: bool,
    pub model: Option<String>,
    pub impact_fx: Option<String>,
}

impl HytaleCodec for ProjectileConfig {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[
            self.model.is_some(),
            self.impact_fx.is_some(),
        ]));
        self.speed.encode(buf)?;
        self.gravity.encode(buf)?;
        self.lifetime.encode(buf)?;
        self.damage.encode(buf)?;
        self.pierce.encode(buf)?;
        self.bounce.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(model) = &self.model {
            table.mark(buf, 0)?;
            model.encode(buf)?;
        }
        if let Some(impact_fx) = &self.impact_fx {
            table.mark(buf, 1)?;
            impact_fx.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let speed = f32::decode(cur)?;
        let gravity = f32::decode(cur)?;
        let lifetime = f32::decode(cur)?;
        let damage = f32::decode(cur)?;
        let pierce = u8::decode(cur)?;
        let bounce = bool::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let model = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let impact_fx = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        Ok(Self {
            speed,
            gravity,
            lifetime,
            damage,
            pierce,
            bounce,
            model,
            impact_fx,
        })
    }
}

/// Projectile config sync plus retired names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateProjectileConfigs {
    pub update: UpdateType,
    pub configs: Option<BTreeMap<String, ProjectileConfig>>,
    pub removed: Option<Vec<String>>,
}

impl AssetPacket for UpdateProjectileConfigs {
    const PACKET_ID: u32 = 85;
    const FIXED_BLOCK_SIZE: usize = 1;
    const VARIABLE_FIELD_COUNT: usize = 2;
    const USES_OFFSET_TABLE: bool = true;
    const MAX_SIZE: usize = 1_048_576;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_dict_and_removed(
            buf,
            self.update,
            &[],
            self.configs.as_ref(),
            self.removed.as_ref(),
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, configs, removed) = read_dict_and_removed(cur, &mut [])?;
        Ok(Self {
            update,
            configs,
            removed,
        })
    }
}
