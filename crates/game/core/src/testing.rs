//! Shared fixture for engine tests.

use crate::ability::{AbilityCatalog, AbilityDescriptor};
use crate::config::CombatConfig;
use crate::engine::CombatEngine;
use crate::env::CombatEnv;
use crate::grid::{TileApply, TileEffect, TileTemplate};
use crate::state::{
    Entity, EntityId, EntityKind, ItemId, ItemLocation, ItemTemplate, RoomId, World,
};
use crate::stats::StatTables;

/// A world with one room plus the rules an engine needs.
///
/// Entities are spawned through the engine, so they start with full pools.
/// Adjust `tables` or `config` before spawning to change the rules.
pub(crate) struct Fixture {
    pub world: World,
    pub catalog: AbilityCatalog,
    pub tables: StatTables,
    pub config: CombatConfig,
    pub room: RoomId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut world = World::new(7);
        let room = world.add_room("arena");
        Self {
            world,
            catalog: AbilityCatalog::new(),
            tables: StatTables::standard(),
            config: CombatConfig::new(),
            room,
        }
    }

    /// Flat tables: no evasion, defense, resistance or regeneration.
    pub fn flat() -> Self {
        Self {
            tables: StatTables::flat(40, 100, 50),
            ..Self::new()
        }
    }

    pub fn engine(&mut self) -> CombatEngine<'_> {
        CombatEngine::new(
            &mut self.world,
            CombatEnv::new(&self.catalog, &self.tables, &self.config),
        )
    }

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let room = self.room;
        self.engine().spawn(entity, room)
    }

    pub fn character(&mut self, name: &str) -> EntityId {
        self.spawn(Entity::new(name, EntityKind::Character))
    }

    pub fn creature(&mut self, name: &str) -> EntityId {
        self.spawn(Entity::new(name, EntityKind::Npc))
    }

    /// Adds `descriptor` to the catalog and teaches it to `entity`.
    pub fn learn(&mut self, entity: EntityId, descriptor: AbilityDescriptor) {
        let key = descriptor.key.clone();
        self.catalog.insert(descriptor);
        if let Some(record) = self.world.entity_mut(entity) {
            record.abilities.push(key);
        }
    }

    pub fn give(&mut self, entity: EntityId, template: &ItemTemplate) -> ItemId {
        self.world
            .mint_item(template, ItemLocation::Carried(entity))
    }

    /// Bare item template; set `gear`, `components` or `use_fn` as needed.
    pub fn template(name: &str) -> ItemTemplate {
        ItemTemplate {
            key: name.to_lowercase().replace(' ', "_"),
            name: name.to_string(),
            weight: 1,
            gear: None,
            components: Default::default(),
            use_fn: None,
        }
    }

    /// Lays an attack-suppressing swarm over the cell `entity` holds in its
    /// battle.
    pub fn swarm_under(engine: &mut CombatEngine<'_>, entity: EntityId) {
        let room = engine
            .world()
            .battle_room_of(entity)
            .expect("entity is fighting");
        let position = engine
            .world()
            .battle(room)
            .and_then(|record| record.grid.coordinates(entity))
            .expect("entity is on the grid");
        let template = TileTemplate {
            name: "swarm".into(),
            apply: TileApply::SuppressAttacks,
            duration: 30,
        };
        engine.lay_tile(room, TileEffect::from_template(&template, None, vec![position]));
        assert!(engine.on_swarm_tile(entity));
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        self.world.entity(id).expect("fixture entity exists")
    }
}
