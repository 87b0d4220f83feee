//! Spawning, respawning and resuming a restored world.

use tracing::{info, warn};

use super::CombatEngine;
use crate::events::CombatEvent;
use crate::schedule::TimerKind;
use crate::state::{Entity, EntityId, Pool, ResourceKind, RoomId};

impl<'a> CombatEngine<'a> {
    /// Registers `entity` in `room` with full pools.
    ///
    /// The room becomes the entity's home unless it already has one.
    pub fn spawn(&mut self, mut entity: Entity, room: RoomId) -> EntityId {
        entity.home.get_or_insert(room);
        entity.location = None;
        let id = self.world_mut().entities.insert_with(|_| entity);
        self.refill(id);
        self.world_mut().move_entity(id, Some(room));
        id
    }

    /// Brings a dead or knocked-out entity back at home with full pools.
    pub fn respawn(&mut self, entity: EntityId) {
        let Some(record) = self.world_mut().entity_mut(entity) else {
            return;
        };
        let Some(home) = record.home.or(record.location) else {
            warn!(%entity, "respawn without a home; skipped");
            return;
        };
        record.knocked_out = false;
        record.cooldowns.clear();
        self.clear_timed_effects(entity);
        self.refill(entity);
        self.world_mut().move_entity(entity, Some(home));

        let name = self.name(entity);
        self.say(home, format!("{name} appears."));
        self.emit(CombatEvent::Respawned { room: home, entity });
        info!(%entity, %home, "respawned");
    }

    /// Repairs timer bookkeeping after a world was restored from a snapshot.
    ///
    /// Battles that never began their first turn are dropped. Running
    /// battles keep their cursor, timer and action points and only get their
    /// interval timer back if it went missing.
    pub fn resume(&mut self) {
        let stale: Vec<RoomId> = self
            .world()
            .battles
            .iter()
            .filter(|(_, record)| record.round == 0)
            .map(|(room, _)| *room)
            .collect();
        for room in stale {
            warn!(%room, "dropping battle that never started");
            self.world_mut().battles.remove(&room);
        }

        let rooms: Vec<RoomId> = self.world().battles.keys().copied().collect();
        for room in rooms {
            self.resume_interval(room);
            self.resume_ai(room);
        }
    }

    /// Tokens restart when a timer wheel is rebuilt, so the interval timer is
    /// found by kind rather than by the token the record remembers.
    fn resume_interval(&mut self, room: RoomId) {
        let pending = self
            .world()
            .timers
            .contains(|kind| matches!(kind, TimerKind::TurnInterval { room: r } if *r == room));
        if pending {
            return;
        }
        let at = self.world().clock + u64::from(self.config().turn_interval.max(1));
        let token = self
            .world_mut()
            .timers
            .schedule(at, TimerKind::TurnInterval { room });
        if let Some(record) = self.world_mut().battle_mut(room) {
            record.interval_token = Some(token);
        }
        info!(%room, "battle resumed");
    }

    fn resume_ai(&mut self, room: RoomId) {
        let Some(record) = self.world().battle(room) else {
            return;
        };
        let Some(current) = record.current() else {
            return;
        };
        let waiting = self.world().timers.contains(|kind| {
            matches!(kind, TimerKind::AiStep { room: r, entity } if *r == room && *entity == current)
        });
        if waiting {
            return;
        }
        // A remembered token may now name an unrelated timer.
        if let Some(record) = self.world_mut().battle_mut(room) {
            record.ai_token = None;
        }
        if self.world().entity(current).is_some_and(Entity::is_ai) {
            let delay = self.config().ai_action_delay;
            self.schedule_ai(room, current, delay);
        }
    }

    fn refill(&mut self, entity: EntityId) {
        let Some(stats) = self.stats(entity) else {
            return;
        };
        if let Some(record) = self.world_mut().entity_mut(entity) {
            for resource in [ResourceKind::Hp, ResourceKind::Mana, ResourceKind::Stamina] {
                *record.pool_mut(resource) = Pool::full(stats.max(resource));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::state::{ItemLocation, TimerToken};
    use crate::testing::Fixture;

    #[test]
    fn spawned_entities_start_full_at_home() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let room = fixture.room;

        let record = fixture.entity(ann);
        assert_eq!(record.location, Some(room));
        assert_eq!(record.home, Some(room));
        assert_eq!(record.hp, Pool::full(40));
        assert_eq!(record.mana, Pool::full(100));
        assert!(fixture.world.rooms.get(room).unwrap().occupants.contains(&ann));
    }

    #[test]
    fn slain_creature_leaves_a_corpse_and_respawns() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let tail = fixture.give(rat, &Fixture::template("Rat Tail"));
        let room = fixture.room;
        let mut engine = fixture.engine();

        assert!(engine.deal_damage(rat, 100, Some(ann)));

        assert_eq!(engine.world().entity(rat).unwrap().location, None);
        let corpse = engine
            .world()
            .items
            .values()
            .find(|item| item.corpse_of == Some(rat))
            .unwrap();
        assert_eq!(corpse.location, ItemLocation::Room(room));
        assert_eq!(
            engine.world().item(tail).unwrap().location,
            ItemLocation::Inside(corpse.id)
        );

        engine.advance(CombatConfig::DEFAULT_RESPAWN_DELAY);

        let record = engine.world().entity(rat).unwrap();
        assert_eq!(record.location, Some(room));
        assert_eq!(record.hp.current, 40);
        assert!(engine.world().outbox.events().contains(&CombatEvent::Respawned { room, entity: rat }));
    }

    #[test]
    fn knocked_out_character_stays_down() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let room = fixture.room;
        let mut engine = fixture.engine();

        engine.deal_damage(ann, 100, None);

        let record = engine.world().entity(ann).unwrap();
        assert!(record.knocked_out);
        assert_eq!(record.location, Some(room));
        assert!(!engine.world().timers.contains(|kind| matches!(kind, TimerKind::Respawn { .. })));
    }

    #[test]
    fn resume_restores_missing_timers() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let room = fixture.room;
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 1).unwrap();
        engine.pass_turn(ann).unwrap();

        let mut restored = engine.world().clone();
        restored.timers = Default::default();
        drop(engine);
        fixture.world = restored;
        let mut engine = fixture.engine();

        engine.resume();

        let timers = &engine.world().timers;
        assert!(timers.contains(|kind| matches!(kind, TimerKind::TurnInterval { room: r } if *r == room)));
        assert!(timers.contains(|kind| matches!(kind, TimerKind::AiStep { entity, .. } if *entity == rat)));
    }

    #[test]
    fn resume_ignores_tokens_reused_by_a_rebuilt_wheel() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let room = fixture.room;
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 1).unwrap();
        engine.pass_turn(ann).unwrap();

        let mut restored = engine.world().clone();
        restored.timers = Default::default();
        // The fresh wheel hands these tokens out again.
        let record = restored.battles.get_mut(&room).unwrap();
        record.interval_token = Some(TimerToken(2));
        record.ai_token = Some(TimerToken(1));
        drop(engine);
        fixture.world = restored;
        let mut engine = fixture.engine();

        engine.resume();

        let timers = &engine.world().timers;
        assert_eq!(timers.len(), 2);
        assert!(timers.contains(|kind| matches!(kind, TimerKind::TurnInterval { room: r } if *r == room)));
        assert!(timers.contains(|kind| matches!(kind, TimerKind::AiStep { entity, .. } if *entity == rat)));
        let record = engine.world().battle(room).unwrap();
        assert!(timers.is_pending(record.interval_token.unwrap()));
        assert!(timers.is_pending(record.ai_token.unwrap()));
    }

    #[test]
    fn resume_drops_battles_that_never_started() {
        let mut fixture = Fixture::flat();
        let room = fixture.room;
        fixture.world.battles.insert(
            room,
            crate::turn::TurnRecord::new(room, crate::grid::Grid::new(4, 4)),
        );
        let mut engine = fixture.engine();

        engine.resume();

        assert!(engine.world().battles.is_empty());
    }
}
