//! Out-of-combat tick and resource regeneration.

use strum::IntoEnumIterator;
use tracing::trace;

use super::CombatEngine;
use crate::state::{EntityId, ResourceKind};

impl<'a> CombatEngine<'a> {
    /// One-second update of every located entity outside a battle.
    ///
    /// Order per entity: effects pulse once, cooldowns wind down one second,
    /// pools regenerate one second's worth. Battles run the same steps from
    /// `begin_turn` at turn scale instead.
    pub fn tick_out_of_combat(&mut self) {
        let idle: Vec<EntityId> = self
            .world()
            .entities
            .iter()
            .filter(|(_, record)| record.location.is_some() && !record.knocked_out)
            .map(|(id, _)| id)
            .collect();

        for entity in idle {
            if self.is_in_combat(entity) || !self.is_standing(entity) {
                continue;
            }
            if self.pulse_effects(entity, 1, 1).defeated {
                continue;
            }
            if let Some(record) = self.world_mut().entity_mut(entity) {
                record.tick_cooldowns(1);
            }
            self.regenerate(entity, 1);
        }
    }

    /// Regenerates every pool of `entity` for `secs` seconds at its derived
    /// rates. Returns the whole points gained per resource.
    pub fn regenerate(&mut self, entity: EntityId, secs: u32) -> [(ResourceKind, u32); 3] {
        let mut gained = [
            (ResourceKind::Hp, 0),
            (ResourceKind::Mana, 0),
            (ResourceKind::Stamina, 0),
        ];
        let Some(stats) = self.stats(entity) else {
            return gained;
        };
        let Some(record) = self.world_mut().entity_mut(entity) else {
            return gained;
        };
        if !record.is_standing() {
            return gained;
        }
        for (slot, resource) in gained.iter_mut().zip(ResourceKind::iter()) {
            let points =
                record
                    .pool_mut(resource)
                    .regenerate(stats.regen(resource), secs, stats.max(resource));
            *slot = (resource, points);
        }
        trace!(%entity, secs, ?gained, "regenerated");
        gained
    }
}
