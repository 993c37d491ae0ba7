// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Camera feel packets (ids 65–66).

use crate::{
    assets::update::{flat_codec, int_keyed_packet, string_keyed_packet},
    codec::HytaleCodec,
};

flat_codec! {
    /// Screen shake impulse preset.
    pub struct CameraShake {
        pub amplitude: f32,
        pub frequency: f32,
        pub duration: f32,
        pub falloff: f32,
    }
}

string_keyed_packet! {
    UpdateCameraShakes, id = 65, shakes: CameraShake, max_size = 262_144
}

flat_codec! {
    /// Third/first person camera tuning.
    pub struct CameraProfile {
        pub fov: f32,
        pub distance: f32,
        pub pitch_min: f32,
        pub pitch_max: f32,
        pub collision: bool,
    }
}

int_keyed_packet! {
    UpdateCameraProfiles, id = 66, profiles: CameraProfile, max_size = 262_144
}
