//! Equipment slots for entities.
//!
//! Slots reference items by [`ItemId`]; the gear data itself lives on the
//! item record. Worn gear feeds the stat pipeline and attaches its passive
//! effects while equipped.

use std::collections::BTreeMap;

use super::ItemId;

/// Wearable slots, in display order.
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
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipSlot {
    Primary,
    Secondary,
    Head,
    Neck,
    Torso,
    AboutBody,
    Arms,
    Waist,
    Legs,
    Feet,
}

/// Items currently worn, keyed by slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, ItemId>,
}

impl Equipment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> EquipmentBuilder {
        EquipmentBuilder::default()
    }

    pub fn get(&self, slot: EquipSlot) -> Option<ItemId> {
        self.slots.get(&slot).copied()
    }

    /// Puts an item into a slot, returning the previous occupant if any.
    pub fn equip(&mut self, slot: EquipSlot, item: ItemId) -> Option<ItemId> {
        self.slots.insert(slot, item)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<ItemId> {
        self.slots.remove(&slot)
    }

    /// Slot holding `item`, if it is worn.
    pub fn slot_of(&self, item: ItemId) -> Option<EquipSlot> {
        self.slots
            .iter()
            .find_map(|(slot, worn)| (*worn == item).then_some(*slot))
    }

    /// Worn items in slot order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.values().copied()
    }

    pub fn clear(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.slots).into_values().collect()
    }
}

#[derive(Default)]
pub struct EquipmentBuilder {
    slots: BTreeMap<EquipSlot, ItemId>,
}

impl EquipmentBuilder {
    pub fn slot(mut self, slot: EquipSlot, item: ItemId) -> Self {
        self.slots.insert(slot, item);
        self
    }

    pub fn build(self) -> Equipment {
        Equipment { slots: self.slots }
    }
}
