//! The built-in flag catalogue.

use crate::groups::keys;

use super::flag_type::{PayloadKind, StandardFlagType};
use super::value::FlagValue;

/// Ids of the built-in flag types.
pub mod ids {
    pub const BLOCK_BREAK: &str = "block_break";
    pub const BLOCK_PLACE: &str = "block_place";
    pub const INTERACT_DOOR: &str = "interact_door";
    pub const INTERACT_ITEM_FRAME: &str = "interact_item_frame";
    pub const PREVENT_PLAYERS: &str = "prevent_players";
    pub const FARMLAND_TRAMPLE: &str = "farmland_trample";
    pub const TNT_DEFUSE: &str = "tnt_defuse";
    pub const MONSTER_PREVENTION: &str = "monster_prevention";
    pub const FALL_DAMAGE: &str = "fall_damage";
    pub const ENTITY_DAMAGE_PLAYER: &str = "entity_damage_player";
    pub const CREEPER_GRIEF: &str = "creeper_grief";
    pub const ENDERMAN_GRIEF: &str = "enderman_grief";
    pub const ZOMBIE_GRIEF: &str = "zombie_grief";
    pub const SKELETON_GRIEF: &str = "skeleton_grief";
    pub const ENDER_DRAGON_GRIEF: &str = "ender_dragon_grief";
    pub const WITHER_GRIEF: &str = "wither_grief";
    pub const ENDERMITE_GRIEF: &str = "endermite_grief";
    pub const GREETINGS: &str = "greetings";
    pub const LEAVING: &str = "leaving";
    pub const BALANCE: &str = "balance";
    pub const ENTRY_FEE: &str = "entry_fee";
}

// (id, name, enabled by default, bypass key)
const PROTECTIONS: &[(&str, &str, bool, Option<&str>)] = &[
    (ids::BLOCK_BREAK, "Block Break", true, Some(keys::BLOCK_BREAK)),
    (ids::BLOCK_PLACE, "Block Place", true, Some(keys::BLOCK_PLACE)),
    (ids::INTERACT_DOOR, "Interact Door", true, Some(keys::INTERACT_DOOR)),
    (ids::INTERACT_ITEM_FRAME, "Interact Item Frame", true, Some(keys::INTERACT_ITEM_FRAME)),
    (ids::PREVENT_PLAYERS, "Prevent Players", false, Some(keys::ENTER_REGION)),
    (ids::FARMLAND_TRAMPLE, "Farmland Trample", true, None),
    (ids::TNT_DEFUSE, "TNT Defuse", false, None),
    (ids::MONSTER_PREVENTION, "Monster Prevention", false, None),
    (ids::FALL_DAMAGE, "Fall Damage", false, None),
    (ids::ENTITY_DAMAGE_PLAYER, "Entity Damage Player", false, None),
    (ids::CREEPER_GRIEF, "Creeper Grief", true, None),
    (ids::ENDERMAN_GRIEF, "Enderman Grief", true, None),
    (ids::ZOMBIE_GRIEF, "Zombie Grief", true, None),
    (ids::SKELETON_GRIEF, "Skeleton Grief", true, None),
    (ids::ENDER_DRAGON_GRIEF, "Ender Dragon Grief", true, None),
    (ids::WITHER_GRIEF, "Wither Grief", true, None),
    (ids::ENDERMITE_GRIEF, "Endermite Grief", true, None),
];

/// Every built-in flag type, in registration order.
#[must_use]
pub fn standard_types() -> Vec<StandardFlagType> {
    let mut types: Vec<StandardFlagType> = PROTECTIONS
        .iter()
        .map(|&(id, name, enabled, key)| {
            let ty = StandardFlagType::new(id, name, PayloadKind::Unit)
                .enabled(enabled)
                .with_default(FlagValue::Unit);
            match key {
                Some(key) => ty.keyed(key),
                None => ty,
            }
        })
        .collect();

    types.push(StandardFlagType::new(ids::GREETINGS, "Greetings", PayloadKind::Text));
    types.push(StandardFlagType::new(ids::LEAVING, "Leaving", PayloadKind::Text));
    types.push(StandardFlagType::new(ids::BALANCE, "Balance", PayloadKind::Balance));
    types.push(StandardFlagType::new(ids::ENTRY_FEE, "Entry Fee", PayloadKind::Price).tagged());
    types
}

/// Ids of every built-in flag type.
pub fn standard_ids() -> impl Iterator<Item = &'static str> {
    PROTECTIONS
        .iter()
        .map(|&(id, ..)| id)
        .chain([ids::GREETINGS, ids::LEAVING, ids::BALANCE, ids::ENTRY_FEE])
}
