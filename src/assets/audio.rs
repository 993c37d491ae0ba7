// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Audio packets (ids 78–83).
//!
//! Reverb and equalizer effects share a body shape: thirteen f32
//! parameters, an enabled flag, then the optional effect id inline.

use std::{collections::BTreeMap, io::Cursor};

use bytes::{BufMut, BytesMut};

use crate::{
    assets::{
        AssetPacket,
        particles::{read_dict_and_removed, write_dict_and_removed},
        update::{
            OffsetTable, OffsetView, UpdateType, flat_codec, int_keyed_packet,
            nullbit, pack_nullbits, read_inline_opt_string, string_keyed_packet,
            write_inline_opt_string,
        },
    },
    codec::{
        HytaleCodec,
        error::{DecodeError, EncodeError},
    },
};

/// Positional sound event; file and category behind a two-slot
/// entry-local table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundEvent {
    pub volume: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub attenuation: f32,
    pub stream: bool,
    pub file: Option<String>,
    pub category: Option<String>,
}

impl HytaleCodec for SoundEvent {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.file.is_some(), self.category.is_some()]));
        self.volume.encode(buf)?;
        self.pitch_min.encode(buf)?;
        self.pitch_max.encode(buf)?;
        self.attenuation.encode(buf)?;
        self.stream.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(file) = &self.file {
            table.mark(buf, 0)?;
            file.encode(buf)?;
        }
        if let Some(category) = &self.category {
            table.mark(buf, 1)?;
            category.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let volume = f32::decode(cur)?;
        let pitch_min = f32::decode(cur)?;
        let pitch_max = f32::decode(cur)?;
        let attenuation = f32::decode(cur)?;
        let stream = bool::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let file = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let category = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        Ok(Self {
            volume,
            pitch_min,
            pitch_max,
            attenuation,
            stream,
            file,
            category,
        })
    }
}

/// Sound event sync plus retired names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSoundEvents {
    pub update: UpdateType,
    pub events: Option<BTreeMap<String, SoundEvent>>,
    pub removed: Option<Vec<String>>,
}

impl AssetPacket for UpdateSoundEvents {
    const PACKET_ID: u32 = 78;
    const FIXED_BLOCK_SIZE: usize = 1;
    const VARIABLE_FIELD_COUNT: usize = 2;
    const USES_OFFSET_TABLE: bool = true;
    const MAX_SIZE: usize = 2_097_152;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_dict_and_removed(
            buf,
            self.update,
            &[],
            self.events.as_ref(),
            self.removed.as_ref(),
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let (update, events, removed) = read_dict_and_removed(cur, &mut [])?;
        Ok(Self {
            update,
            events,
            removed,
        })
    }
}

/// Streamed music track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusicTrack {
    pub duration: f32,
    pub fade_in: f32,
    pub combat: bool,
    pub file: Option<String>,
}

impl HytaleCodec for MusicTrack {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.file.is_some()]));
        self.duration.encode(buf)?;
        self.fade_in.encode(buf)?;
        self.combat.encode(buf)?;
        write_inline_opt_string(buf, self.file.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let duration = f32::decode(cur)?;
        let fade_in = f32::decode(cur)?;
        let combat = bool::decode(cur)?;
        let file = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            duration,
            fade_in,
            combat,
            file,
        })
    }
}

string_keyed_packet! {
    UpdateMusicTracks, id = 79, tracks: MusicTrack, max_size = 524_288
}

flat_codec! {
    /// Mixer bus: volume, ducking applied by higher-priority buses, and
    /// the parent bus id.
    pub struct AudioCategory {
        pub volume: f32,
        pub ducking_db: f32,
        pub parent_id: u32,
    }
}

int_keyed_packet! {
    UpdateAudioCategories, id = 80, categories: AudioCategory, max_size = 262_144
}

macro_rules! audio_effect_codec {
    ($(#[$meta:meta])* $name:ident { $( $field:ident ),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( pub $field: f32, )*
            pub enabled: bool,
            pub id: Option<String>,
        }

        impl HytaleCodec for $name {
            fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
                buf.put_u8(pack_nullbits(&[self.id.is_some()]));
                $( self.$field.encode(buf)?; )*
                self.enabled.encode(buf)?;
                write_inline_opt_string(buf, self.id.as_ref())
            }

            fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
                let bits = u8::decode(cur)?;
                $( let $field = f32::decode(cur)?; )*
                let enabled = bool::decode(cur)?;
                let id = read_inline_opt_string(cur, nullbit(bits, 0))?;
                Ok(Self {
                    $( $field, )*
                    enabled,
                    id,
                })
            }
        }
    };
}

audio_effect_codec! {
    /// Room reverb send, thirteen f32 parameters.
    ReverbEffect {
        room_size, damping, wet_level, dry_level, width, pre_delay, decay_time,
        diffusion, density, low_cut, high_cut, early_gain, late_gain,
    }
}

int_keyed_packet! {
    UpdateReverbEffects, id = 81, effects: ReverbEffect, max_size = 262_144
}

audio_effect_codec! {
    /// Three-band parametric equalizer, thirteen f32 parameters.
    EqualizerEffect {
        low_gain, low_cutoff, mid1_gain, mid1_center, mid1_width, mid2_gain,
        mid2_center, mid2_width, mid3_gain, mid3_center, mid3_width, high_gain,
        high_cutoff,
    }
}

int_keyed_packet! {
    UpdateEqualizerEffects, id = 82, effects: EqualizerEffect, max_size = 262_144
}

/// Looping environmental bed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbienceLoop {
    pub volume: f32,
    pub fade_seconds: f32,
    pub file: Option<String>,
}

impl HytaleCodec for AmbienceLoop {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.file.is_some()]));
        self.volume.encode(buf)?;
        self.fade_seconds.encode(buf)?;
        write_inline_opt_string(buf, self.file.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let volume = f32::decode(cur)?;
        let fade_seconds = f32::decode(cur)?;
        let file = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self {
            volume,
            fade_seconds,
            file,
        })
    }
}

int_keyed_packet! {
    UpdateAmbienceLoops, id = 83, loops: AmbienceLoop, max_size = 524_288
}
