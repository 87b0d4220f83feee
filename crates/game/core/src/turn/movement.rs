//! Grid movement, passing and leaving a fight.

use tracing::debug;

use crate::effect::EffectKey;
use crate::engine::CombatEngine;
use crate::error::{BlockReason, CombatError};
use crate::events::EndReason;
use crate::grid::{Direction, GridError};
use crate::state::{EntityId, Position};

impl<'a> CombatEngine<'a> {
    /// Moves `entity` one cell in `direction`.
    ///
    /// The first step of a stride costs one action point and buys `speed`
    /// cells; later steps spend those cells until they run out.
    pub fn step(&mut self, entity: EntityId, direction: Direction) -> Result<Position, CombatError> {
        let room = self
            .world()
            .battle_room_of(entity)
            .ok_or(CombatError::NotInCombat)?;
        if !self.is_turn(entity) {
            return Err(CombatError::TurnGated);
        }
        if self.has_effect(entity, &EffectKey::FROZEN) {
            return Err(CombatError::ActionBlocked(BlockReason::Frozen));
        }
        if self.has_effect(entity, &EffectKey::STUCK) {
            return Err(CombatError::ActionBlocked(BlockReason::Stuck));
        }
        let speed = self.stats(entity).map(|stats| stats.speed).unwrap_or(1).max(1);

        let record = self.world().battle(room).ok_or(CombatError::NotInCombat)?;
        let from = record
            .grid
            .coordinates(entity)
            .ok_or(CombatError::NotInCombat)?;
        let to = direction.apply(from);
        if !record.grid.contains(to) {
            return Err(GridError::OutOfBounds(to).into());
        }
        if let Some(occupant) = record.grid.at(to) {
            return Err(GridError::Occupied {
                position: to,
                occupant,
            }
            .into());
        }
        let state = record.state(entity).copied().unwrap_or_default();
        if state.moves_left == 0 && state.ap == 0 {
            return Err(CombatError::NotEnoughActionPoints {
                needed: 1,
                available: 0,
            });
        }

        let Some(record) = self.world_mut().battle_mut(room) else {
            return Err(CombatError::NotInCombat);
        };
        record.grid.place(entity, to)?;
        if let Some(state) = record.state_mut(entity) {
            if state.moves_left == 0 {
                state.ap -= 1;
                state.moves_left = speed;
            }
            state.moves_left -= 1;
        }

        let name = self.name(entity);
        self.say(room, format!("{name} moves {direction}."));
        debug!(%entity, %to, "stepped");

        self.apply_tiles_under(entity);
        self.finish_action(room, entity, 0);
        Ok(to)
    }

    /// Gives up the rest of the turn.
    pub fn pass_turn(&mut self, entity: EntityId) -> Result<(), CombatError> {
        let room = self
            .world()
            .battle_room_of(entity)
            .ok_or(CombatError::NotInCombat)?;
        if !self.is_turn(entity) {
            return Err(CombatError::TurnGated);
        }
        let name = self.name(entity);
        self.say(room, format!("{name} passes."));
        self.next_turn(room);
        Ok(())
    }

    /// Leaves the battle on the entity's own turn.
    ///
    /// The battle breaks up when either side is left without combatants.
    pub fn disengage(&mut self, entity: EntityId) -> Result<(), CombatError> {
        let room = self
            .world()
            .battle_room_of(entity)
            .ok_or(CombatError::NotInCombat)?;
        if !self.is_turn(entity) {
            return Err(CombatError::TurnGated);
        }

        if let Some(record) = self.world_mut().battle_mut(room) {
            record.remove(entity);
            record.grid.remove(entity);
        }
        let name = self.name(entity);
        self.say(room, format!("{name} disengages from the fight."));
        debug!(%entity, %room, "disengaged");

        let sides: Vec<bool> = self
            .world()
            .battle(room)
            .map(|record| record.order.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.is_standing(*id))
            .map(|id| self.hostility(id))
            .collect();
        if !sides.contains(&true) || !sides.contains(&false) {
            self.end_battle(room, EndReason::AllDisengaged);
        } else {
            self.settle(room);
        }
        Ok(())
    }
}
