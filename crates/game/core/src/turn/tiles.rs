//! Tile effects acting on the combatants standing on them.

use tracing::debug;

use crate::effect::EffectOrigin;
use crate::engine::CombatEngine;
use crate::grid::{TileApply, TileEffect};
use crate::state::{EntityId, Position, TileEffectId};

impl<'a> CombatEngine<'a> {
    /// Applies every tile effect under `entity`, oldest first.
    ///
    /// Called when the entity enters a cell and when its turn begins there.
    /// Returns true when tile damage defeated it.
    pub(crate) fn apply_tiles_under(&mut self, entity: EntityId) -> bool {
        let Some(tiles) = self.tiles_under(entity) else {
            return false;
        };
        for tile in tiles {
            if self.apply_tile(entity, &tile) {
                return true;
            }
        }
        false
    }

    /// Lays a new tile effect in the battle of `room` and applies it at
    /// once to everyone already standing inside it.
    pub(crate) fn lay_tile(&mut self, room: crate::state::RoomId, tile: TileEffect) {
        let Some(record) = self.world_mut().battle_mut(room) else {
            return;
        };
        let name = tile.name.clone();
        let id = record.grid.add_tile(tile);
        let Some(laid) = record.grid.tile(id).cloned() else {
            return;
        };
        let victims: Vec<EntityId> = record
            .grid
            .occupants()
            .filter(|(_, position)| laid.covers(*position))
            .map(|(entity, _)| entity)
            .collect();
        debug!(%room, cells = laid.cells.len(), "tile effect laid");
        self.say(room, format!("{name} spreads across the ground."));

        for victim in victims {
            if self.world().battle(room).is_none() {
                break;
            }
            self.apply_tile(victim, &laid);
        }
    }

    fn tiles_under(&self, entity: EntityId) -> Option<Vec<TileEffect>> {
        let room = self.world().battle_room_of(entity)?;
        let grid = &self.world().battle(room)?.grid;
        let position: Position = grid.coordinates(entity)?;
        let ids: Vec<TileEffectId> = grid.effects_at(position).to_vec();
        Some(
            ids.into_iter()
                .filter_map(|id| grid.tile(id).cloned())
                .collect(),
        )
    }

    fn apply_tile(&mut self, entity: EntityId, tile: &TileEffect) -> bool {
        match &tile.apply {
            TileApply::Damage(range) => {
                let amount = self.roll(range.min, range.max);
                let name = self.name(entity);
                self.say_near(
                    entity,
                    format!(
                        "{name} takes {amount} {} damage from the {}.",
                        range.damage_type, tile.name
                    ),
                );
                self.deal_damage(entity, amount, tile.source)
            }
            TileApply::Inflict(template) => {
                self.apply_effect(entity, template, tile.source, EffectOrigin::Tile);
                false
            }
            TileApply::SuppressAttacks => false,
        }
    }
}
