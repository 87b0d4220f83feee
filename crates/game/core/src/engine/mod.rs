//! Authoritative reducer for the combat world.
//!
//! [`CombatEngine`] borrows a [`World`] together with the immutable
//! [`CombatEnv`] and is the only way state changes. Its methods are spread
//! over the modules that own each concern:
//!
//! | module | operations |
//! |---|---|
//! | `turn::handler` | start, join, begin turn, spend action, next turn, timeout, defeat checks |
//! | `turn::movement` | step, pass, disengage |
//! | `ability::cast` | check and cast abilities |
//! | `combat` | weapon attacks, damage, defeat hooks |
//! | `effect::apply` | apply, pulse and dispel effects |
//! | `ai::planner` | AI decisions |
//! | `engine::clock` | advancing time and firing timers |
//! | `engine::ticker` | out-of-combat 1 Hz tick and regeneration |
//! | `engine::items` | item use and equipment |
//! | `engine::lifecycle` | spawn, respawn and restore |
//!
//! Every call runs to completion before returning; there is no await point
//! inside the core, so a cast can never interleave with a turn change.

mod clock;
mod items;
mod lifecycle;
mod ticker;

use crate::config::CombatConfig;
use crate::effect::EffectKey;
use crate::env::{CombatEnv, RngOracle};
use crate::events::CombatEvent;
use crate::grid::TileApply;
use crate::state::{EntityId, Position, ResourceKind, RoomId, World};
use crate::stats::DerivedStats;

/// Game engine that owns every state transition of a [`World`].
pub struct CombatEngine<'a> {
    world: &'a mut World,
    env: CombatEnv<'a>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(world: &'a mut World, env: CombatEnv<'a>) -> Self {
        Self { world, env }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn env(&self) -> CombatEnv<'a> {
        self.env
    }

    pub(crate) fn config(&self) -> &'a CombatConfig {
        self.env.config
    }

    /// Runs the stat pipeline for `entity` against its current inputs.
    pub fn stats(&self, entity: EntityId) -> Option<DerivedStats> {
        let record = self.world.entity(entity)?;
        let worn = self.world.worn_items(record);
        Some(DerivedStats::compute(
            record.level,
            &record.attributes,
            &worn,
            &record.effects,
            self.env.tables,
        ))
    }

    /// True while `entity` is a combatant of a running battle.
    pub fn is_in_combat(&self, entity: EntityId) -> bool {
        self.world.battle_room_of(entity).is_some()
    }

    /// True when `entity` holds the current turn of its battle.
    pub fn is_turn(&self, entity: EntityId) -> bool {
        self.world
            .battle_room_of(entity)
            .and_then(|room| self.world.battle(room))
            .and_then(|record| record.current())
            == Some(entity)
    }

    /// Cell `entity` occupies in its battle, if any.
    pub fn position_of(&self, entity: EntityId) -> Option<Position> {
        let room = self.world.battle_room_of(entity)?;
        self.world.battle(room)?.grid.coordinates(entity)
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    pub(crate) fn roll(&mut self, min: u32, max: u32) -> u32 {
        self.world.rng.range(min, max)
    }

    /// Uniform index into `len` choices.
    pub(crate) fn pick(&mut self, len: usize) -> Option<usize> {
        self.world.rng.pick(len)
    }

    pub(crate) fn has_effect(&self, entity: EntityId, key: &EffectKey) -> bool {
        self.world
            .entity(entity)
            .is_some_and(|record| record.effects.has(key))
    }

    pub(crate) fn is_standing(&self, entity: EntityId) -> bool {
        self.world
            .entity(entity)
            .is_some_and(|record| record.is_standing())
    }

    pub(crate) fn name(&self, entity: EntityId) -> String {
        self.world.name_of(entity)
    }

    pub(crate) fn room_of(&self, entity: EntityId) -> Option<RoomId> {
        self.world.entity(entity).and_then(|record| record.location)
    }

    /// Broadcasts to the room `entity` stands in, if any.
    pub(crate) fn say_near(&mut self, entity: EntityId, text: impl Into<String>) {
        if let Some(room) = self.room_of(entity) {
            self.world.outbox.say(room, text);
        }
    }

    pub(crate) fn say(&mut self, room: RoomId, text: impl Into<String>) {
        self.world.outbox.say(room, text);
    }

    pub(crate) fn tell(&mut self, entity: EntityId, text: impl Into<String>) {
        self.world.outbox.tell(entity, text);
    }

    pub(crate) fn emit(&mut self, event: CombatEvent) {
        self.world.outbox.push(event);
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// Pulls every pool back under its derived maximum.
    pub(crate) fn clamp_pools(&mut self, entity: EntityId) {
        let Some(stats) = self.stats(entity) else {
            return;
        };
        if let Some(record) = self.world.entity_mut(entity) {
            for resource in [ResourceKind::Hp, ResourceKind::Mana, ResourceKind::Stamina] {
                record.pool_mut(resource).clamp(stats.max(resource));
            }
        }
    }

    /// Restores `amount` of a pool, capped at its maximum. Returns the gain.
    pub(crate) fn restore(&mut self, entity: EntityId, resource: ResourceKind, amount: u32) -> u32 {
        let Some(max) = self.stats(entity).map(|stats| stats.max(resource)) else {
            return 0;
        };
        self.world
            .entity_mut(entity)
            .map(|record| record.pool_mut(resource).restore(amount, max))
            .unwrap_or(0)
    }

    /// True when `entity` stands on a tile that suppresses weapon attacks.
    pub(crate) fn on_swarm_tile(&self, entity: EntityId) -> bool {
        let Some(record) = self
            .world
            .battle_room_of(entity)
            .and_then(|room| self.world.battle(room))
        else {
            return false;
        };
        let Some(position) = record.grid.coordinates(entity) else {
            return false;
        };
        record.grid.effects_at(position).iter().any(|id| {
            record
                .grid
                .tile(*id)
                .is_some_and(|tile| matches!(tile.apply, TileApply::SuppressAttacks))
        })
    }
}
