// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Decode-by-id dispatch over the asset family.

use bytes::BytesMut;
use enum_dispatch::enum_dispatch;

use crate::{
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
    codec::error::{DecodeError, EncodeError},
};

/// Object-shaped view of an asset packet used by frame emitters that
/// hold a heterogeneous batch of updates.
#[enum_dispatch]
pub trait AssetBody {
    fn packet_id(&self) -> u32;
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EncodeError>;
}

impl<T: AssetPacket> AssetBody for T {
    fn packet_id(&self) -> u32 {
        T::PACKET_ID
    }

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.encode_payload(buf)
    }
}

/// Any packet of the asset family.
#[enum_dispatch(AssetBody)]
#[derive(Debug, Clone, PartialEq)]
pub enum AssetUpdate {
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
}

impl AssetUpdate {
    /// Decodes the body of packet `id`, failing `UnknownPacket` outside
    /// the asset range.
    pub fn decode(id: u32, bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(match id {
            UpdateBlockTypes::PACKET_ID => UpdateBlockTypes::decode(bytes)?.into(),
            UpdateBlockHitboxes::PACKET_ID => UpdateBlockHitboxes::decode(bytes)?.into(),
            UpdateHitboxCollisionConfigs::PACKET_ID => {
                UpdateHitboxCollisionConfigs::decode(bytes)?.into()
            },
            UpdateBlockSoundSets::PACKET_ID => {
                UpdateBlockSoundSets::decode(bytes)?.into()
            },
            UpdateBlockParticles::PACKET_ID => {
                UpdateBlockParticles::decode(bytes)?.into()
            },
            UpdateFluids::PACKET_ID => UpdateFluids::decode(bytes)?.into(),
            UpdateFoliageConfigs::PACKET_ID => {
                UpdateFoliageConfigs::decode(bytes)?.into()
            },
            UpdateWeathers::PACKET_ID => UpdateWeathers::decode(bytes)?.into(),
            UpdateTrails::PACKET_ID => UpdateTrails::decode(bytes)?.into(),
            UpdateParticleSystems::PACKET_ID => {
                UpdateParticleSystems::decode(bytes)?.into()
            },
            UpdateParticleEmitters::PACKET_ID => {
                UpdateParticleEmitters::decode(bytes)?.into()
            },
            UpdateEntityEffects::PACKET_ID => UpdateEntityEffects::decode(bytes)?.into(),
            UpdateStatusEffects::PACKET_ID => UpdateStatusEffects::decode(bytes)?.into(),
            UpdateEntityAnimations::PACKET_ID => {
                UpdateEntityAnimations::decode(bytes)?.into()
            },
            UpdateItems::PACKET_ID => UpdateItems::decode(bytes)?.into(),
            UpdateItemCategories::PACKET_ID => {
                UpdateItemCategories::decode(bytes)?.into()
            },
            UpdateItemQualities::PACKET_ID => UpdateItemQualities::decode(bytes)?.into(),
            UpdateRecipes::PACKET_ID => UpdateRecipes::decode(bytes)?.into(),
            UpdateCraftingCategories::PACKET_ID => {
                UpdateCraftingCategories::decode(bytes)?.into()
            },
            UpdateLootTables::PACKET_ID => UpdateLootTables::decode(bytes)?.into(),
            UpdateHarvestables::PACKET_ID => UpdateHarvestables::decode(bytes)?.into(),
            UpdateEnvironments::PACKET_ID => UpdateEnvironments::decode(bytes)?.into(),
            UpdateSkyboxes::PACKET_ID => UpdateSkyboxes::decode(bytes)?.into(),
            UpdateCloudLayers::PACKET_ID => UpdateCloudLayers::decode(bytes)?.into(),
            UpdateDayCycles::PACKET_ID => UpdateDayCycles::decode(bytes)?.into(),
            UpdateCameraShakes::PACKET_ID => UpdateCameraShakes::decode(bytes)?.into(),
            UpdateCameraProfiles::PACKET_ID => {
                UpdateCameraProfiles::decode(bytes)?.into()
            },
            UpdateItemInteractions::PACKET_ID => {
                UpdateItemInteractions::decode(bytes)?.into()
            },
            UpdateUnarmedInteractions::PACKET_ID => {
                UpdateUnarmedInteractions::decode(bytes)?.into()
            },
            UpdateBlockInteractions::PACKET_ID => {
                UpdateBlockInteractions::decode(bytes)?.into()
            },
            UpdateEmotes::PACKET_ID => UpdateEmotes::decode(bytes)?.into(),
            UpdateDecals::PACKET_ID => UpdateDecals::decode(bytes)?.into(),
            UpdateCrosshairs::PACKET_ID => UpdateCrosshairs::decode(bytes)?.into(),
            UpdateMapMarkers::PACKET_ID => UpdateMapMarkers::decode(bytes)?.into(),
            UpdateNameplates::PACKET_ID => UpdateNameplates::decode(bytes)?.into(),
            UpdateDamageIndicators::PACKET_ID => {
                UpdateDamageIndicators::decode(bytes)?.into()
            },
            UpdateHudLayouts::PACKET_ID => UpdateHudLayouts::decode(bytes)?.into(),
            UpdateInputBindings::PACKET_ID => UpdateInputBindings::decode(bytes)?.into(),
            UpdateSoundEvents::PACKET_ID => UpdateSoundEvents::decode(bytes)?.into(),
            UpdateMusicTracks::PACKET_ID => UpdateMusicTracks::decode(bytes)?.into(),
            UpdateAudioCategories::PACKET_ID => {
                UpdateAudioCategories::decode(bytes)?.into()
            },
            UpdateReverbEffects::PACKET_ID => UpdateReverbEffects::decode(bytes)?.into(),
            UpdateEqualizerEffects::PACKET_ID => {
                UpdateEqualizerEffects::decode(bytes)?.into()
            },
            UpdateAmbienceLoops::PACKET_ID => UpdateAmbienceLoops::decode(bytes)?.into(),
            UpdateTagPatterns::PACKET_ID => UpdateTagPatterns::decode(bytes)?.into(),
            UpdateProjectileConfigs::PACKET_ID => {
                UpdateProjectileConfigs::decode(bytes)?.into()
            },
            other => return Err(DecodeError::UnknownPacket(other)),
        })
    }
}
