//! Authoritative world state.
//!
//! This module owns the data that describes rooms, entities, items, battles
//! and pending timers. Hosts read it freely but mutate it through
//! [`crate::engine::CombatEngine`], which keeps the cross-record invariants.
pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use crate::env::PcgRng;
use crate::events::Outbox;
use crate::schedule::TimerWheel;
use crate::turn::TurnRecord;

/// Everything the combat core simulates.
///
/// The whole value serializes; a restored world resumes battles and timers
/// exactly where they were. The outbox is transient and starts empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct World {
    /// Seed the RNG stream was created from.
    pub seed: u64,
    pub clock: Tick,
    pub rooms: Registry<RoomId, Room>,
    pub entities: Registry<EntityId, Entity>,
    pub items: Registry<ItemId, Item>,
    /// At most one battle per room.
    pub battles: BTreeMap<RoomId, TurnRecord>,
    pub timers: TimerWheel,
    pub rng: PcgRng,
    next_effect_id: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub outbox: Outbox,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: PcgRng::new(seed),
            ..Self::default()
        }
    }

    pub fn add_room(&mut self, name: impl Into<String>) -> RoomId {
        let room = Room::new(name);
        self.rooms.insert_with(|_| room)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn name_of(&self, id: EntityId) -> String {
        self.entity(id)
            .map(|entity| entity.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn next_effect_id(&mut self) -> EffectId {
        self.next_effect_id += 1;
        EffectId(self.next_effect_id)
    }

    pub fn battle(&self, room: RoomId) -> Option<&TurnRecord> {
        self.battles.get(&room)
    }

    pub fn battle_mut(&mut self, room: RoomId) -> Option<&mut TurnRecord> {
        self.battles.get_mut(&room)
    }

    /// Room of the battle `entity` takes part in.
    pub fn battle_room_of(&self, entity: EntityId) -> Option<RoomId> {
        let room = self.entity(entity)?.location?;
        self.battle(room)
            .filter(|record| record.contains(entity))
            .map(|_| room)
    }

    /// Items in the worn slots of `entity`, in slot order.
    pub fn worn_items(&self, entity: &Entity) -> Vec<&Item> {
        entity
            .equipment
            .items()
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    /// Moves an entity between rooms, keeping occupant lists in step.
    pub fn move_entity(&mut self, entity: EntityId, to: Option<RoomId>) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let from = std::mem::replace(&mut record.location, to);
        if let Some(room) = from.and_then(|room| self.rooms.get_mut(room)) {
            room.leave(entity);
        }
        if let Some(room) = to.and_then(|room| self.rooms.get_mut(room)) {
            room.enter(entity);
        }
    }

    /// Creates an item from a template at `location`.
    pub fn mint_item(&mut self, template: &ItemTemplate, location: ItemLocation) -> ItemId {
        let id = self.items.insert_with(|id| template.mint(id, ItemLocation::Nowhere));
        self.place_item(id, location);
        id
    }

    /// Detaches an item from wherever it is and puts it at `location`.
    pub fn place_item(&mut self, item: ItemId, location: ItemLocation) {
        self.detach_item(item);
        let Some(record) = self.items.get_mut(item) else {
            return;
        };
        record.location = location;
        match location {
            ItemLocation::Carried(holder) => {
                if let Some(entity) = self.entities.get_mut(holder) {
                    entity.inventory.push(item);
                }
            }
            ItemLocation::Room(room) => {
                if let Some(room) = self.rooms.get_mut(room) {
                    room.items.push(item);
                }
            }
            ItemLocation::Inside(container) => {
                if let Some(container) = self.items.get_mut(container) {
                    container.contents.push(item);
                }
            }
            ItemLocation::Nowhere => {}
        }
    }

    /// Destroys an item and everything inside it.
    pub fn delete_item(&mut self, item: ItemId) {
        self.detach_item(item);
        if let Some(record) = self.items.remove(item) {
            for inner in record.contents {
                self.delete_item(inner);
            }
        }
    }

    fn detach_item(&mut self, item: ItemId) {
        let Some(location) = self.items.get(item).map(|record| record.location) else {
            return;
        };
        match location {
            ItemLocation::Carried(holder) => {
                if let Some(entity) = self.entities.get_mut(holder) {
                    entity.inventory.retain(|id| *id != item);
                    if let Some(slot) = entity.equipment.slot_of(item) {
                        entity.equipment.unequip(slot);
                    }
                }
            }
            ItemLocation::Room(room) => {
                if let Some(room) = self.rooms.get_mut(room) {
                    room.items.retain(|id| *id != item);
                }
            }
            ItemLocation::Inside(container) => {
                if let Some(container) = self.items.get_mut(container) {
                    container.contents.retain(|id| *id != item);
                }
            }
            ItemLocation::Nowhere => {}
        }
        if let Some(record) = self.items.get_mut(item) {
            record.location = ItemLocation::Nowhere;
        }
    }

    /// Total weight carried by `entity`.
    pub fn carried_weight(&self, entity: &Entity) -> u32 {
        entity
            .inventory
            .iter()
            .filter_map(|id| self.items.get(*id))
            .map(|item| item.weight)
            .sum()
    }

    /// Whether `holder` can take one more item of `weight` without going
    /// over its carry limits.
    pub fn can_carry(&self, holder: EntityId, weight: u32) -> bool {
        let Some(entity) = self.entities.get(holder) else {
            return false;
        };
        entity.inventory.len() < entity.carry.max_items as usize
            && self.carried_weight(entity).saturating_add(weight) <= entity.carry.max_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> ItemTemplate {
        ItemTemplate {
            key: "potion".into(),
            name: "a red potion".into(),
            weight: 1,
            gear: None,
            components: Default::default(),
            use_fn: Some(ItemUse::Heal { min: 5, max: 5 }),
        }
    }

    #[test]
    fn move_entity_updates_both_rooms() {
        let mut world = World::new(1);
        let hall = world.add_room("hall");
        let yard = world.add_room("yard");
        let id = world
            .entities
            .insert_with(|_| Entity::new("Ann", EntityKind::Character));

        world.move_entity(id, Some(hall));
        world.move_entity(id, Some(yard));

        assert!(world.rooms.get(hall).unwrap().occupants.is_empty());
        assert_eq!(world.rooms.get(yard).unwrap().occupants, vec![id]);
        assert_eq!(world.entity(id).unwrap().location, Some(yard));
    }

    #[test]
    fn items_move_between_holders() {
        let mut world = World::new(1);
        let hall = world.add_room("hall");
        let id = world
            .entities
            .insert_with(|_| Entity::new("Ann", EntityKind::Character));
        let item = world.mint_item(&potion(), ItemLocation::Carried(id));

        world.place_item(item, ItemLocation::Room(hall));

        assert!(world.entity(id).unwrap().inventory.is_empty());
        assert_eq!(world.rooms.get(hall).unwrap().items, vec![item]);
    }

    #[test]
    fn carry_limits_count_weight_and_items() {
        let mut world = World::new(1);
        let id = world
            .entities
            .insert_with(|_| Entity::new("Ann", EntityKind::Character));
        world.entities.get_mut(id).unwrap().carry = CarryLimits {
            max_weight: 3,
            max_items: 2,
        };
        let mut heavy = potion();
        heavy.weight = 2;
        world.mint_item(&heavy, ItemLocation::Carried(id));

        assert!(world.can_carry(id, 1));
        assert!(!world.can_carry(id, 2));

        world.mint_item(&potion(), ItemLocation::Carried(id));
        assert!(!world.can_carry(id, 0));
    }

    #[test]
    fn deleting_container_deletes_contents() {
        let mut world = World::new(1);
        let bag = world.mint_item(&potion(), ItemLocation::Nowhere);
        let inner = world.mint_item(&potion(), ItemLocation::Inside(bag));

        world.delete_item(bag);

        assert!(world.item(bag).is_none());
        assert!(world.item(inner).is_none());
    }
}
