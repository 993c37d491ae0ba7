// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Envelope discipline: nullability bits, empty-vs-absent, offset
//! tables, and the byte-exact scenarios a reference client checks.

use std::collections::BTreeMap;

use hex_literal::hex;
use hytale_server_rs::assets::{
    AssetPacket,
    audio::UpdateAudioCategories,
    blocks::UpdateBlockTypes,
    environment::{UpdateWeathers, Weather},
    hud::{Emote, UpdateEmotes},
    particles::{UpdateParticleSystems, UpdateTrails},
    projectiles::UpdateProjectileConfigs,
    update::{UpdateType, empty_int_keyed, empty_string_keyed, nullbit, pack_nullbits},
};
use hytale_server_rs::codec::EncodeError;

#[test]
fn test_nullbits_pack_in_declared_order() {
    assert_eq!(pack_nullbits(&[]), 0x00);
    assert_eq!(pack_nullbits(&[true]), 0x01);
    assert_eq!(pack_nullbits(&[false, true]), 0x02);
    assert_eq!(pack_nullbits(&[true, false, true, true]), 0x0D);
    assert!(nullbit(0x0D, 0));
    assert!(!nullbit(0x0D, 1));
    assert!(nullbit(0x0D, 2));
}

#[test]
fn test_empty_audio_categories_is_seven_bytes() {
    let packet = UpdateAudioCategories {
        update: UpdateType::Init,
        max_id: 0,
        categories: Some(BTreeMap::new()),
    };
    let bytes = packet.encode().expect("encode failed");
    assert_eq!(bytes.as_ref(), hex!("01 00 00 00 00 00 00"));
    assert_eq!(
        bytes.as_ref(),
        empty_int_keyed(UpdateType::Init, 0, &[]).as_ref()
    );
}

#[test]
fn test_empty_block_types_is_eleven_bytes() {
    let packet = UpdateBlockTypes {
        update: UpdateType::Init,
        max_id: 0,
        update_geometry: false,
        update_textures: false,
        update_lods: false,
        clear_cached_shapes: false,
        block_types: Some(BTreeMap::new()),
    };
    let bytes = packet.encode().expect("encode failed");
    assert_eq!(bytes.len(), 11);
}

#[test]
fn test_empty_trails_is_three_bytes() {
    let packet = UpdateTrails {
        update: UpdateType::Init,
        trails: Some(BTreeMap::new()),
    };
    let bytes = packet.encode().expect("encode failed");
    assert_eq!(bytes.as_ref(), hex!("01 00 00"));
    assert_eq!(bytes.as_ref(), empty_string_keyed(UpdateType::Init).as_ref());
}

#[test]
fn test_projectile_configs_null_both_slots() {
    let packet = UpdateProjectileConfigs {
        update: UpdateType::Init,
        configs: None,
        removed: None,
    };
    let bytes = packet.encode().expect("encode failed");
    assert_eq!(bytes.len(), 10);
    assert_eq!(bytes.as_ref(), hex!("00 00 ffffffff ffffffff"));
}

#[test]
fn test_weathers_single_entry_layout() {
    let mut weathers = BTreeMap::new();
    weathers.insert(
        1u32,
        Weather {
            id: Some("clear".to_string()),
            ..Default::default()
        },
    );
    let packet = UpdateWeathers {
        update: UpdateType::Init,
        max_id: 1,
        weathers: Some(weathers),
    };
    let bytes = packet.encode().expect("encode failed");

    assert_eq!(bytes[0], 0x01, "nullability bit");
    assert_eq!(bytes[1], 0x00, "update type");
    assert_eq!(&bytes[2..6], hex!("01 00 00 00"), "max_id");
    assert_eq!(bytes[6], 0x01, "varint count");
    assert_eq!(&bytes[7..11], hex!("01 00 00 00"), "entry key");
    assert_eq!(bytes[11], 0x01, "entry nullability bit");
    assert_eq!(&bytes[bytes.len() - 6..], &b"\x05clear"[..]);
}

#[test]
fn test_absent_vs_empty_inline_dictionary() {
    let absent = UpdateWeathers {
        update: UpdateType::Patch,
        max_id: 7,
        weathers: None,
    };
    let bytes = absent.encode().expect("encode failed");
    // No nullability bit, no varint count.
    assert_eq!(bytes.as_ref(), hex!("00 01 07 00 00 00"));
    let decoded = UpdateWeathers::decode(&bytes).expect("decode failed");
    assert!(decoded.weathers.is_none());

    let empty = UpdateWeathers {
        update: UpdateType::Patch,
        max_id: 7,
        weathers: Some(BTreeMap::new()),
    };
    let bytes = empty.encode().expect("encode failed");
    assert_eq!(bytes.as_ref(), hex!("01 01 07 00 00 00 00"));
    let decoded = UpdateWeathers::decode(&bytes).expect("decode failed");
    assert_eq!(decoded.weathers, Some(BTreeMap::new()));
}

#[test]
fn test_absent_vs_empty_offset_dictionary() {
    // Present-but-empty dictionary: bit set, offset 0, varint 0 in the
    // variable region; removed stays -1.
    let packet = UpdateParticleSystems {
        update: UpdateType::Init,
        systems: Some(BTreeMap::new()),
        removed: None,
    };
    let bytes = packet.encode().expect("encode failed");
    assert_eq!(bytes.as_ref(), hex!("01 00 00000000 ffffffff 00"));

    let decoded = UpdateParticleSystems::decode(&bytes).expect("decode failed");
    assert_eq!(decoded.systems, Some(BTreeMap::new()));
    assert!(decoded.removed.is_none());
}

#[test]
fn test_oversized_payload_is_rejected() {
    let mut emotes = BTreeMap::new();
    emotes.insert(
        "wave".to_string(),
        Emote {
            duration: 1.0,
            looping: false,
            animation: Some("x".repeat(UpdateEmotes::MAX_SIZE + 1)),
        },
    );
    let packet = UpdateEmotes {
        update: UpdateType::Init,
        emotes: Some(emotes),
    };
    match packet.encode() {
        Err(EncodeError::TooLarge { len, max }) => {
            assert!(len > max);
            assert_eq!(max, UpdateEmotes::MAX_SIZE);
        },
        other => panic!("expected TooLarge, got {other:?}"),
    }
}
