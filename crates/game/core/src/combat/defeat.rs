//! Defeat hooks: corpses, knockouts, respawn timers and experience.

use tracing::{debug, warn};

use crate::engine::CombatEngine;
use crate::events::CombatEvent;
use crate::schedule::TimerKind;
use crate::state::{DeathPolicy, EntityId, Item, ItemLocation};

impl<'a> CombatEngine<'a> {
    /// Routes a defeat through the battle when `entity` is fighting one,
    /// otherwise runs the hook directly and rewards `killer`.
    pub(crate) fn defeat(&mut self, entity: EntityId, killer: Option<EntityId>) {
        if let Some(room) = self.world().battle_room_of(entity) {
            self.at_defeat(room, entity, killer);
            return;
        }
        let recipients: Vec<EntityId> = killer.into_iter().collect();
        self.award_experience(entity, &recipients);
        self.defeat_hook(entity);
    }

    /// Entity-defined consequences of reaching zero health.
    ///
    /// Timed effects are cleared first. Creatures that die leave a corpse
    /// holding everything they carried and come back home later; characters
    /// that knock out stay where they fell until revived.
    pub(crate) fn defeat_hook(&mut self, entity: EntityId) {
        let Some(record) = self.world_mut().entity_mut(entity) else {
            return;
        };
        record.hp.current = 0;
        record.hp.buildup = 0;
        let policy = record.death_policy;
        let room = record.location;
        let name = record.name.clone();

        self.clear_timed_effects(entity);
        self.emit(CombatEvent::Defeated { room, entity });

        match policy {
            DeathPolicy::KnocksOut => {
                if let Some(record) = self.world_mut().entity_mut(entity) {
                    record.knocked_out = true;
                }
                self.say_near(entity, format!("{name} is knocked out!"));
            }
            DeathPolicy::Dies { respawn_secs } => {
                self.say_near(entity, format!("{name} dies!"));
                self.leave_corpse(entity, &name);
                self.world_mut().move_entity(entity, None);
                let at = self.world().clock + u64::from(respawn_secs);
                self.world_mut()
                    .timers
                    .schedule(at, TimerKind::Respawn { entity });
                debug!(%entity, respawn_secs, "respawn scheduled");
            }
        }
    }

    /// Moves carried items and gold into a corpse container in the room.
    fn leave_corpse(&mut self, entity: EntityId, name: &str) {
        let Some(record) = self.world().entity(entity) else {
            return;
        };
        let Some(room) = record.location else {
            warn!(%entity, "defeated entity has no location; no corpse left");
            return;
        };
        let carried = record.inventory.clone();
        let gold = record.gold;

        let corpse = self.world_mut().items.insert_with(|id| Item {
            gold,
            corpse_of: Some(entity),
            ..Item::new(id, format!("the corpse of {name}"))
        });
        self.world_mut().place_item(corpse, ItemLocation::Room(room));

        for item in carried {
            self.remove_item_effects(entity, item);
            self.world_mut().place_item(item, ItemLocation::Inside(corpse));
        }
        if let Some(record) = self.world_mut().entity_mut(entity) {
            record.gold = 0;
            record.equipment.clear();
        }
    }

    /// Grants the defeated entity's experience value to every recipient that
    /// tracks experience.
    pub(crate) fn award_experience(&mut self, defeated: EntityId, recipients: &[EntityId]) {
        let Some(value) = self
            .world()
            .entity(defeated)
            .map(|record| record.defeat_experience)
            .filter(|value| *value > 0)
        else {
            return;
        };
        for recipient in recipients {
            let Some(record) = self.world_mut().entity_mut(*recipient) else {
                continue;
            };
            let Some(experience) = record.experience.as_mut() else {
                continue;
            };
            *experience += value;
            self.tell(*recipient, format!("You gain {value} experience."));
        }
    }
}
