// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Item, recipe, loot and harvestable packets (ids 54–60).

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
        varint::{get_varint, put_varint},
    },
};

/// Item definition; model and icon strings behind a two-slot
/// entry-local offset table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub max_stack: u16,
    pub max_durability: u16,
    pub rarity: u8,
    pub consumable: bool,
    pub model: Option<String>,
    pub icon: Option<String>,
}

impl HytaleCodec for Item {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.model.is_some(), self.icon.is_some()]));
        self.max_stack.encode(buf)?;
        self.max_durability.encode(buf)?;
        self.rarity.encode(buf)?;
        self.consumable.encode(buf)?;
        let table = OffsetTable::reserve(buf, 2);
        if let Some(model) = &self.model {
            table.mark(buf, 0)?;
            model.encode(buf)?;
        }
        if let Some(icon) = &self.icon {
            table.mark(buf, 1)?;
            icon.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let max_stack = u16::decode(cur)?;
        let max_durability = u16::decode(cur)?;
        let rarity = u8::decode(cur)?;
        let consumable = bool::decode(cur)?;
        let view = OffsetView::read(cur, 2)?;
        let model = if nullbit(bits, 0) && view.seek(cur, 0)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        let icon = if nullbit(bits, 1) && view.seek(cur, 1)? {
            Some(String::decode(cur)?)
        } else {
            None
        };
        Ok(Self {
            max_stack,
            max_durability,
            rarity,
            consumable,
            model,
            icon,
        })
    }
}

/// Item sync. `update_models`/`update_icons` tell the client which GPU
/// caches the dictionary invalidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateItems {
    pub update: UpdateType,
    pub update_models: bool,
    pub update_icons: bool,
    pub items: Option<BTreeMap<String, Item>>,
    pub removed: Option<Vec<String>>,
}

impl AssetPacket for UpdateItems {
    const PACKET_ID: u32 = 54;
    const FIXED_BLOCK_SIZE: usize = 3;
    const VARIABLE_FIELD_COUNT: usize = 2;
    const USES_OFFSET_TABLE: bool = true;
    const MAX_SIZE: usize = 4_194_304;

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let extra = [u8::from(self.update_models), u8::from(self.update_icons)];
        write_dict_and_removed(
            buf,
            self.update,
            &extra,
            self.items.as_ref(),
            self.removed.as_ref(),
        )
    }

    fn decode_payload(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let mut extra = [0u8; 2];
        let (update, items, removed) = read_dict_and_removed(cur, &mut extra)?;
        Ok(Self {
            update,
            update_models: extra[0] != 0,
            update_icons: extra[1] != 0,
            items,
            removed,
        })
    }
}

/// Inventory tab an item sorts under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCategory {
    pub sort_order: u16,
    pub icon: Option<String>,
}

impl HytaleCodec for ItemCategory {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.icon.is_some()]));
        self.sort_order.encode(buf)?;
        write_inline_opt_string(buf, self.icon.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let sort_order = u16::decode(cur)?;
        let icon = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self { sort_order, icon })
    }
}

string_keyed_packet! {
    UpdateItemCategories, id = 55, categories: ItemCategory, max_size = 262_144
}

flat_codec! {
    /// Rarity tier tint and value scale.
    pub struct ItemQuality {
        pub color: u32,
        pub value_multiplier: f32,
    }
}

int_keyed_packet! {
    UpdateItemQualities, id = 56, qualities: ItemQuality, max_size = 262_144
}

flat_codec! {
    /// One recipe input.
    pub struct Ingredient {
        pub item: String,
        pub count: u8,
    }
}

/// Crafting recipe: fixed scalars then a varint-counted ingredient list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    pub bench_type: u8,
    pub output_count: u8,
    pub craft_seconds: f32,
    pub ingredients: Vec<Ingredient>,
}

impl HytaleCodec for Recipe {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.bench_type.encode(buf)?;
        self.output_count.encode(buf)?;
        self.craft_seconds.encode(buf)?;
        put_varint(buf, self.ingredients.len() as u32);
        for ingredient in &self.ingredients {
            ingredient.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bench_type = u8::decode(cur)?;
        let output_count = u8::decode(cur)?;
        let craft_seconds = f32::decode(cur)?;
        let count = get_varint(cur)?;
        let mut ingredients = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            ingredients.push(Ingredient::decode(cur)?);
        }
        Ok(Self {
            bench_type,
            output_count,
            craft_seconds,
            ingredients,
        })
    }
}

string_keyed_packet! {
    UpdateRecipes, id = 57, recipes: Recipe, max_size = 2_097_152
}

/// Crafting menu grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CraftingCategory {
    pub sort_order: u16,
    pub icon: Option<String>,
}

impl HytaleCodec for CraftingCategory {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u8(pack_nullbits(&[self.icon.is_some()]));
        self.sort_order.encode(buf)?;
        write_inline_opt_string(buf, self.icon.as_ref())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let bits = u8::decode(cur)?;
        let sort_order = u16::decode(cur)?;
        let icon = read_inline_opt_string(cur, nullbit(bits, 0))?;
        Ok(Self { sort_order, icon })
    }
}

string_keyed_packet! {
    UpdateCraftingCategories, id = 58, categories: CraftingCategory, max_size = 262_144
}

flat_codec! {
    /// One weighted drop.
    pub struct LootDrop {
        pub item: String,
        pub weight: f32,
        pub min_count: u8,
        pub max_count: u8,
    }
}

/// Loot table: roll count plus weighted drops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LootTable {
    pub rolls: u8,
    pub drops: Vec<LootDrop>,
}

impl HytaleCodec for LootTable {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.rolls.encode(buf)?;
        put_varint(buf, self.drops.len() as u32);
        for drop in &self.drops {
            drop.encode(buf)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<&[u8]>) -> Result<Self, DecodeError> {
        let rolls = u8::decode(cur)?;
        let count = get_varint(cur)?;
        let mut drops = Vec::with_capacity(count.min(256) as usize);
        for _ in 0..count {
            drops.push(LootDrop::decode(cur)?);
        }
        Ok(Self { rolls, drops })
    }
}

int_keyed_packet! {
    UpdateLootTables, id = 59, tables: LootTable, max_size = 2_097_152
}

flat_codec! {
    /// What a block/plant yields when harvested.
    pub struct Harvestable {
        pub tool_type: u8,
        pub tool_tier: u8,
        pub regrow_seconds: f32,
        pub loot_table: u32,
    }
}

int_keyed_packet! {
    UpdateHarvestables, id = 60, harvestables: Harvestable, max_size = 1_048_576
}
