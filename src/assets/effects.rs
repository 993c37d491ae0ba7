// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Entity-visible effect packets (ids 51–53).

use std::io::Cursor;

use bytes::{BufMut, BytesMut};

use crate::{
    assets::update::{
        OffsetTable, OffsetView, int_keyed_packet, nullbit, pack_nullbits,
        read_inline_opt_string, string_keyed_packet, write_inline_opt_string,
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Entity effect definition. Six optional strings live behind the
/// largest per-entry offset table in the family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityEffect {
    pub duration: f32,
    pub tick_interval: f32,
    pub max_stacks: u8,
    pub debuff: bool,
    pub id: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub particle_system: Option<String>,
    pub attached_model: Option<String>,
    pub sound_event: Option<String>,
}

impl EntityEffect {
    fn variable_fields(&self) -> [&Option<String>; 6] {
        [
            &self.id,
            &self.icon,
            &self.description,
            &self.particle_system,
            &self.attached_model,
            &self.sound_event,
        ]
    }
}

impl HytaleCodec for EntityEffect {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let fields = self.variable_fields();
        let present: Vec<bool> = fields.iter().map(|f| f.is_some()).collect();
        buf.put_u8(pack_nullbits(&present));
        self.duration.encode(buf)?;
        self.tick_interval.encode(buf)?;
        self.max_stacks.encode(buf)?;
        self.debuff.encode(buf)?;
        let table = OffsetTable::reserve(buf, 6);
        for (slot, field) in fields.into_iter().enumerate() {
            if let Some(value) = field {
                table.mark(buf, slot)?;
                value.encode(buf)?;
            }
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let duration = f32::decode(cur)?;
        let tick_interval = f32::decode(cur)?;
        let max_stacks = u8::decode(cur)?;
        let debuff = bool::decode(cur)?;
        let view = OffsetView::read(cur, 6)?;
        let mut fields: [Option<String>; 6] = Default::default();
        for (slot, value) in fields.iter_mut().enumerate() {
            if nullbit(bits, slot) && view.seek(cur, slot)? {
                *value = Some(String::decode(cur)?);
            }
        }
        let [id, icon, description, particle_system, attached_model, sound_event] =
            fields;
        Ok(Self {
            duration,
            tick_interval,
            max_stacks,
            debuff,
            id,
            icon,
            description,
            particle_system,
            attached_model,
            sound_event,
        })
    }
}

int_keyed_packet! {
    UpdateEntityEffects, id = 51, effects: EntityEffect, max_size = 2_097_152
}

/// Lightweight status marker shown in the HUD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEffect {
    pub duration: f32,
    pub amplifier: u8,
    pub id: Option<String>,
}

impl HytaleCodec for StatusEffect {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.id.is_some()]));
        self.duration.encode(buf)?;
        self.amplifier.encode(buf)?;
        write_inline_opt_string(buf, self.id.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let duration = f32::decode(cur)?;
        let amplifier = u8::decode(cur)?;
        let id = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            duration,
            amplifier,
            id,
        })
    }
}

int_keyed_packet! {
    UpdateStatusEffects, id = 52, effects: StatusEffect, max_size = 1_048_576
}

/// Named animation clip binding for an entity rig.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAnimation {
    pub duration: f32,
    pub looping: bool,
    pub priority: u8,
    pub rig: Option<String>,
}

impl HytaleCodec for EntityAnimation {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.rig.is_some()]));
        self.duration.encode(buf)?;
        self.looping.encode(buf)?;
        self.priority.encode(buf)?;
        write_inline_opt_string(buf, self.rig.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let duration = f32::decode(cur)?;
        let looping = bool::decode(cur)?;
        let priority = u8::decode(cur)?;
        let rig = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            duration,
            looping,
            priority,
            rig,
        })
    }
}

string_keyed_packet! {
    UpdateEntityAnimations, id = 53, animations: EntityAnimation, max_size = 2_097_152
}
