//! Item records.
//!
//! One [`Item`] record covers gear, consumables, spell components and
//! corpses. Optional parts carry the data each role needs instead of a
//! separate type per role.

use std::collections::BTreeMap;

use super::{Attribute, DamageRange, EntityId, EquipSlot, ItemId, RoomId, TypedTable};
use crate::effect::{EffectKey, EffectTemplate};

/// Kinds of spell components. Component strength is per item.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentKind {
    Poison,
    Flame,
    Frost,
    Arcane,
    Vitality,
    Shadow,
}

/// Where an item currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemLocation {
    Carried(EntityId),
    Room(RoomId),
    Inside(ItemId),
    #[default]
    Nowhere,
}

/// Weapon profile of a piece of gear.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponProfile {
    pub damage: Vec<DamageRange>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub accuracy_bonus: i32,
    pub ap_to_attack: u8,
    /// Reach in cells; 1 for melee.
    pub range: u32,
}

/// Data carried by wearable items.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gear {
    pub slot: EquipSlot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defense: TypedTable,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resistance: TypedTable,
    #[cfg_attr(feature = "serde", serde(default))]
    pub evasion: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_attribute: Option<(Attribute, i32)>,
    /// Permanent effects attached to the wearer while equipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub passives: Vec<EffectTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapon: Option<WeaponProfile>,
}

impl Gear {
    pub fn new(slot: EquipSlot) -> Self {
        Self {
            slot,
            defense: TypedTable::default(),
            resistance: TypedTable::default(),
            evasion: 0,
            required_level: 0,
            required_attribute: None,
            passives: Vec::new(),
            weapon: None,
        }
    }
}

/// What happens when an item is used.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemUse {
    Heal { min: u32, max: u32 },
    RestoreMana { min: u32, max: u32 },
    RestoreStamina { min: u32, max: u32 },
    Cure(EffectKey),
    ApplyEffect(EffectTemplate),
}

impl ItemUse {
    /// True for uses that restore health. The AI looks for these.
    pub fn heals(&self) -> bool {
        matches!(self, Self::Heal { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub weight: u32,
    pub location: ItemLocation,
    pub gear: Option<Gear>,
    /// Spell component strengths by kind.
    pub components: BTreeMap<ComponentKind, u32>,
    pub use_fn: Option<ItemUse>,
    /// Contained items (corpses, bags).
    pub contents: Vec<ItemId>,
    pub gold: u32,
    /// Set on corpses: whose remains these are.
    pub corpse_of: Option<EntityId>,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            weight: 0,
            location: ItemLocation::Nowhere,
            gear: None,
            components: BTreeMap::new(),
            use_fn: None,
            contents: Vec::new(),
            gold: 0,
            corpse_of: None,
        }
    }

    pub fn weapon(&self) -> Option<&WeaponProfile> {
        self.gear.as_ref().and_then(|gear| gear.weapon.as_ref())
    }

    pub fn component_strength(&self, kind: ComponentKind) -> Option<u32> {
        self.components.get(&kind).copied()
    }
}

/// Reusable description from which items are minted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemTemplate {
    pub key: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gear: Option<Gear>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: BTreeMap<ComponentKind, u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_fn: Option<ItemUse>,
}

impl ItemTemplate {
    pub fn mint(&self, id: ItemId, location: ItemLocation) -> Item {
        Item {
            id,
            name: self.name.clone(),
            weight: self.weight,
            location,
            gear: self.gear.clone(),
            components: self.components.clone(),
            use_fn: self.use_fn.clone(),
            contents: Vec::new(),
            gold: 0,
            corpse_of: None,
        }
    }
}
