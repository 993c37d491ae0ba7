// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashSet;

use hytale_server_rs::{
    assets::{
        AssetPacket,
        audio::{
            UpdateAmbienceLoops, UpdateAudioCategories, UpdateEqualizerEffects,
            UpdateMusicTracks, UpdateReverbEffects, UpdateSoundEvents,
        },
        blocks::{
            UpdateBlockHitboxes, UpdateBlockParticles, UpdateBlockSoundSets,
            UpdateBlockTypes, UpdateHitboxCollisionConfigs,
        },
        camera::{UpdateCameraProfiles, UpdateCameraShakes},
        effects::{UpdateEntityAnimations, UpdateEntityEffects, UpdateStatusEffects},
        environment::{
            UpdateCloudLayers, UpdateDayCycles, UpdateEnvironments, UpdateSkyboxes,
            UpdateWeathers,
        },
        hud::{
            UpdateCrosshairs, UpdateDamageIndicators, UpdateDecals, UpdateEmotes,
            UpdateHudLayouts, UpdateInputBindings, UpdateMapMarkers, UpdateNameplates,
        },
        interactions::{
            UpdateBlockInteractions, UpdateItemInteractions, UpdateUnarmedInteractions,
        },
        items::{
            UpdateCraftingCategories, UpdateHarvestables, UpdateItemCategories,
            UpdateItemQualities, UpdateItems, UpdateLootTables, UpdateRecipes,
        },
        particles::{UpdateParticleEmitters, UpdateParticleSystems, UpdateTrails},
        projectiles::UpdateProjectileConfigs,
        tags::UpdateTagPatterns,
        terrain::{UpdateFluids, UpdateFoliageConfigs},
    },
    registry,
};

#[test]
fn test_ids_are_unique() {
    let mut seen = HashSet::new();
    for descriptor in registry::iter() {
        assert!(
            seen.insert(descriptor.id),
            "duplicate packet id {}",
            descriptor.id
        );
    }
}

#[test]
fn test_size_bounds_are_sane() {
    for descriptor in registry::iter() {
        assert!(
            descriptor.min_size <= descriptor.max_size,
            "{} has min {} > max {}",
            descriptor.name,
            descriptor.min_size,
            descriptor.max_size
        );
    }
}

#[test]
fn test_fixed_size_packets() {
    for name in ["Ping", "Pong", "TimeSync", "BlockUpdate", "EntityTeleport"] {
        let descriptor = registry::iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("missing {name}"));
        assert_eq!(descriptor.min_size, descriptor.max_size, "{name}");
    }
}

#[test]
fn test_lookup_and_name() {
    let ping = registry::lookup(2).expect("Ping missing");
    assert_eq!(ping.name, "Ping");
    assert!(!ping.compressed);

    assert!(registry::lookup(9999).is_none());
    assert_eq!(registry::name(47), "UpdateWeathers");
    assert_eq!(registry::name(9999), "Unknown");
}

#[test]
fn test_ranges_are_dense() {
    let ids: HashSet<u32> = registry::iter().map(|d| d.id).collect();
    for range in [
        0..=3u32,
        10..=18,
        20..=34,
        40..=85,
        100..=119,
        131..=159,
        160..=166,
        170..=179,
        200..=204,
        210..=234,
    ] {
        for id in range {
            assert!(ids.contains(&id), "missing packet id {id}");
        }
    }
    assert_eq!(registry::iter().count(), 170);
}

#[test]
fn test_iteration_is_insertion_ordered() {
    let ids: Vec<u32> = registry::iter().map(|d| d.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

macro_rules! check_asset_descriptor {
    ($($ty:ident),* $(,)?) => {{
        $(
            let descriptor = registry::lookup($ty::PACKET_ID)
                .unwrap_or_else(|| panic!("{} missing from registry", stringify!($ty)));
            assert_eq!(descriptor.name, stringify!($ty));
            assert_eq!(
                descriptor.min_size as usize,
                $ty::VARIABLE_BLOCK_START,
                "{} min_size",
                stringify!($ty)
            );
            assert_eq!(
                descriptor.max_size as usize,
                $ty::MAX_SIZE,
                "{} max_size",
                stringify!($ty)
            );
            assert_eq!(descriptor.compressed, $ty::IS_COMPRESSED);
        )*
    }};
}

#[test]
fn test_asset_descriptors_match_packet_constants() {
    check_asset_descriptor!(
        UpdateBlockTypes,
        UpdateBlockHitboxes,
        UpdateHitboxCollisionConfigs,
        UpdateBlockSoundSets,
        UpdateBlockParticles,
        UpdateFluids,
        UpdateFoliageConfigs,
        UpdateWeathers,
        UpdateTrails,
        UpdateParticleSystems,
        UpdateParticleEmitters,
        UpdateEntityEffects,
        UpdateStatusEffects,
        UpdateEntityAnimations,
        UpdateItems,
        UpdateItemCategories,
        UpdateItemQualities,
        UpdateRecipes,
        UpdateCraftingCategories,
        UpdateLootTables,
        UpdateHarvestables,
        UpdateEnvironments,
        UpdateSkyboxes,
        UpdateCloudLayers,
        UpdateDayCycles,
        UpdateCameraShakes,
        UpdateCameraProfiles,
        UpdateItemInteractions,
        UpdateUnarmedInteractions,
        UpdateBlockInteractions,
        UpdateEmotes,
        UpdateDecals,
        UpdateCrosshairs,
        UpdateMapMarkers,
        UpdateNameplates,
        UpdateDamageIndicators,
        UpdateHudLayouts,
        UpdateInputBindings,
        UpdateSoundEvents,
        UpdateMusicTracks,
        UpdateAudioCategories,
        UpdateReverbEffects,
        UpdateEqualizerEffects,
        UpdateAmbienceLoops,
        UpdateTagPatterns,
        UpdateProjectileConfigs,
    );
}
