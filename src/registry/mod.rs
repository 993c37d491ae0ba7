// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Static packet registry: the single source of truth for frame dispatch.
//!
//! Every packet the protocol speaks has one descriptor here. Decoders
//! consult it to pick the payload codec (compressed vs raw) and to
//! validate the decoded length; encoders use it to reject out-of-bounds
//! payloads before they reach the wire.
//!
//! Identifiers are dense within their named ranges: connection 0–3,
//! auth 10–18, setup 20–34, assets 40–85, player 100–119, world 131–159,
//! entity 160–166, inventory 170–179, window 200–204, interface 210–234.
//! Only the asset range defines payload codecs in this crate; the rest
//! are registry entries consumed by the frame layer alone.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Immutable wire-level facts about one packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketDescriptor {
    pub id: u32,
    pub name: &'static str,
    /// Fixed block plus offset-table width; the shortest legal payload.
    pub min_size: u32,
    /// Upper bound on the *decompressed* payload length.
    pub max_size: u32,
    pub compressed: bool,
}

macro_rules! packet_registry {
    ($( $id:literal => $name:literal, $min:literal ..= $max:literal $(, $compressed:ident)?; )*) => {
        /// All descriptors in insertion (iteration) order.
        pub const DESCRIPTORS: &[PacketDescriptor] = &[
            $( PacketDescriptor {
                id: $id,
                name: $name,
                min_size: $min,
                max_size: $max,
                compressed: packet_registry!(@flag $($compressed)?),
            }, )*
        ];
    };
    (@flag compressed) => { true };
    (@flag) => { false };
}

packet_registry! {
    // connection 0..=3
    0 => "Connect", 102..=4096;
    1 => "Disconnect", 2..=512;
    2 => "Ping", 12..=12;
    3 => "Pong", 12..=12;

    // auth 10..=18
    10 => "AuthGrantRequest", 2..=2048;
    11 => "AuthGrantResponse", 2..=2048;
    12 => "AuthTokenRequest", 2..=4096;
    13 => "AuthTokenResponse", 2..=4096;
    14 => "AuthSuccess", 17..=17;
    15 => "AuthFailure", 2..=512;
    16 => "SessionRefresh", 2..=4096;
    17 => "SessionExpired", 1..=1;
    18 => "Reauthenticate", 2..=4096;

    // setup 20..=34
    20 => "ServerInfo", 8..=2048;
    21 => "ServerSettings", 4..=8192;
    22 => "ClientSettings", 4..=8192;
    23 => "FeatureFlags", 1..=1024;
    24 => "LanguageSync", 2..=256;
    25 => "KeepAliveConfig", 8..=8;
    26 => "ViewDistance", 1..=1;
    27 => "TimeSync", 16..=16;
    28 => "SetupComplete", 1..=1;
    29 => "ResourcePackInfo", 8..=2048;
    30 => "ResourcePackData", 16..=8388608, compressed;
    31 => "WorldHandshake", 24..=4096;
    32 => "ChunkRadius", 4..=4;
    33 => "PlayerPermissions", 2..=2048;
    34 => "SetupFailure", 2..=512;

    // assets 40..=85
    40 => "UpdateBlockTypes", 10..=4194304, compressed;
    41 => "UpdateBlockHitboxes", 6..=1048576, compressed;
    42 => "UpdateHitboxCollisionConfigs", 6..=262144, compressed;
    43 => "UpdateBlockSoundSets", 6..=1048576, compressed;
    44 => "UpdateBlockParticles", 6..=1048576, compressed;
    45 => "UpdateFluids", 6..=524288, compressed;
    46 => "UpdateFoliageConfigs", 6..=524288, compressed;
    47 => "UpdateWeathers", 6..=524288, compressed;
    48 => "UpdateTrails", 2..=1048576, compressed;
    49 => "UpdateParticleSystems", 10..=4194304, compressed;
    50 => "UpdateParticleEmitters", 10..=2097152, compressed;
    51 => "UpdateEntityEffects", 6..=2097152, compressed;
    52 => "UpdateStatusEffects", 6..=1048576, compressed;
    53 => "UpdateEntityAnimations", 2..=2097152, compressed;
    54 => "UpdateItems", 12..=4194304, compressed;
    55 => "UpdateItemCategories", 2..=262144, compressed;
    56 => "UpdateItemQualities", 6..=262144, compressed;
    57 => "UpdateRecipes", 2..=2097152, compressed;
    58 => "UpdateCraftingCategories", 2..=262144, compressed;
    59 => "UpdateLootTables", 6..=2097152, compressed;
    60 => "UpdateHarvestables", 6..=1048576, compressed;
    61 => "UpdateEnvironments", 7..=1048576, compressed;
    62 => "UpdateSkyboxes", 2..=524288, compressed;
    63 => "UpdateCloudLayers", 6..=262144, compressed;
    64 => "UpdateDayCycles", 6..=262144, compressed;
    65 => "UpdateCameraShakes", 2..=262144, compressed;
    66 => "UpdateCameraProfiles", 6..=262144, compressed;
    67 => "UpdateItemInteractions", 2..=1048576, compressed;
    68 => "UpdateUnarmedInteractions", 2..=262144, compressed;
    69 => "UpdateBlockInteractions", 6..=1048576, compressed;
    70 => "UpdateEmotes", 2..=524288, compressed;
    71 => "UpdateDecals", 2..=524288, compressed;
    72 => "UpdateCrosshairs", 6..=131072, compressed;
    73 => "UpdateMapMarkers", 2..=524288, compressed;
    74 => "UpdateNameplates", 6..=131072, compressed;
    75 => "UpdateDamageIndicators", 6..=131072, compressed;
    76 => "UpdateHudLayouts", 2..=1048576, compressed;
    77 => "UpdateInputBindings", 2..=524288, compressed;
    78 => "UpdateSoundEvents", 10..=2097152, compressed;
    79 => "UpdateMusicTracks", 2..=524288, compressed;
    80 => "UpdateAudioCategories", 6..=262144, compressed;
    81 => "UpdateReverbEffects", 6..=262144, compressed;
    82 => "UpdateEqualizerEffects", 6..=262144, compressed;
    83 => "UpdateAmbienceLoops", 6..=524288, compressed;
    84 => "UpdateTagPatterns", 6..=1048576, compressed;
    85 => "UpdateProjectileConfigs", 10..=1048576, compressed;

    // player 100..=119
    100 => "PlayerJoin", 24..=2048;
    101 => "PlayerLeave", 16..=16;
    102 => "PlayerPosition", 25..=25;
    103 => "PlayerRotation", 13..=13;
    104 => "PlayerInput", 9..=64;
    105 => "PlayerAction", 2..=256;
    106 => "PlayerAnimation", 5..=128;
    107 => "PlayerStats", 4..=1024;
    108 => "PlayerHealth", 9..=9;
    109 => "PlayerStamina", 9..=9;
    110 => "PlayerExperience", 12..=12;
    111 => "PlayerAbilities", 4..=256;
    112 => "PlayerGameMode", 1..=1;
    113 => "PlayerSpawnPoint", 28..=28;
    114 => "PlayerRespawn", 1..=64;
    115 => "PlayerListSync", 2..=16384;
    116 => "PlayerSkinUpdate", 18..=8192;
    117 => "PlayerEmote", 3..=128;
    118 => "PlayerRidingUpdate", 17..=17;
    119 => "PlayerDeath", 2..=512;

    // world 131..=159
    131 => "ChunkData", 16..=2097152, compressed;
    132 => "ChunkUnload", 8..=8;
    133 => "BlockUpdate", 16..=16;
    134 => "BlockBatchUpdate", 6..=1048576, compressed;
    135 => "BlockEntityData", 14..=65536;
    136 => "WorldTime", 8..=8;
    137 => "WorldWeatherState", 10..=64;
    138 => "WorldBorder", 20..=20;
    139 => "WorldDifficulty", 1..=1;
    140 => "WorldSpawnPosition", 12..=12;
    141 => "WorldSound", 22..=256;
    142 => "WorldParticleBurst", 26..=512;
    143 => "WorldExplosion", 20..=4096;
    144 => "WorldLightningStrike", 12..=12;
    145 => "WorldFluidUpdate", 14..=14;
    146 => "WorldStructureReveal", 18..=8192;
    147 => "WorldMapChunk", 12..=262144, compressed;
    148 => "WorldPortalState", 16..=128;
    149 => "WorldAmbience", 6..=256;
    150 => "WorldSeasonState", 6..=6;
    151 => "ChunkLightData", 12..=524288, compressed;
    152 => "ChunkHeightmap", 12..=131072, compressed;
    153 => "ChunkBiomeData", 12..=131072, compressed;
    154 => "WorldEventStart", 10..=512;
    155 => "WorldEventStop", 8..=8;
    156 => "WorldDebugShape", 14..=2048;
    157 => "WorldMarkerSync", 2..=16384;
    158 => "WorldAudioZone", 18..=1024;
    159 => "WorldResetRegion", 20..=20;

    // entity 160..=166
    160 => "EntitySpawn", 34..=2048;
    161 => "EntityDespawn", 2..=8192;
    162 => "EntityMove", 20..=20;
    163 => "EntityVelocity", 20..=20;
    164 => "EntityAnimation", 10..=128;
    165 => "EntityStatus", 9..=256;
    166 => "EntityTeleport", 33..=33;

    // inventory 170..=179
    170 => "InventoryContent", 3..=65536;
    171 => "InventorySlot", 4..=4096;
    172 => "InventoryMove", 6..=6;
    173 => "InventoryDrop", 4..=4;
    174 => "HotbarSelect", 1..=1;
    175 => "CursorItem", 2..=4096;
    176 => "CraftRequest", 3..=1024;
    177 => "CraftResult", 2..=4096;
    178 => "EquipmentUpdate", 3..=8192;
    179 => "ContainerSync", 3..=65536;

    // window 200..=204
    200 => "WindowOpen", 4..=2048;
    201 => "WindowClose", 2..=2;
    202 => "WindowClick", 12..=64;
    203 => "WindowResult", 3..=4096;
    204 => "WindowProperty", 8..=8;

    // interface 210..=234
    210 => "InterfaceShow", 2..=4096;
    211 => "InterfaceHide", 2..=256;
    212 => "HudMessage", 2..=2048;
    213 => "ChatMessage", 3..=4096;
    214 => "ChatCommand", 2..=2048;
    215 => "ActionBar", 2..=1024;
    216 => "TitleText", 2..=1024;
    217 => "SubtitleText", 2..=1024;
    218 => "BossBar", 10..=512;
    219 => "Notification", 4..=2048;
    220 => "TooltipUpdate", 2..=8192;
    221 => "MenuState", 2..=1024;
    222 => "DialogOpen", 4..=16384;
    223 => "DialogClose", 2..=2;
    224 => "DialogOption", 3..=512;
    225 => "ScoreboardUpdate", 2..=8192;
    226 => "TabListUpdate", 2..=32768;
    227 => "MapUpdate", 12..=262144, compressed;
    228 => "CompassTarget", 13..=13;
    229 => "WaypointAdd", 16..=512;
    230 => "WaypointRemove", 8..=8;
    231 => "CustomUiEvent", 4..=16384;
    232 => "CursorState", 2..=2;
    233 => "InputFocus", 2..=2;
    234 => "InterfaceError", 2..=512;
}

static BY_ID: Lazy<HashMap<u32, &'static PacketDescriptor>> =
    Lazy::new(|| DESCRIPTORS.iter().map(|d| (d.id, d)).collect());

/// Descriptor for `id`, if the protocol defines it.
#[inline]
pub fn lookup(id: u32) -> Option<&'static PacketDescriptor> {
    BY_ID.get(&id).copied()
}

/// Human-readable packet name, `"Unknown"` for unregistered ids.
#[inline]
pub fn name(id: u32) -> &'static str {
    lookup(id).map_or("Unknown", |d| d.name)
}

/// All descriptors in insertion order.
#[inline]
pub fn iter() -> impl Iterator<Item = &'static PacketDescriptor> {
    DESCRIPTORS.iter()
}
