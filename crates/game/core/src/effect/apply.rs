//! Applying, pulsing and removing effects.
//!
//! The set itself only knows keys and stacking. Everything that needs the
//! rest of the world lives here: cross-effect rules, ceasefire echoes,
//! per-pulse damage and resource changes, wear-off messages and pool clamping
//! after stat changes.

use tracing::debug;

use super::{EffectInstance, EffectKey, EffectKind, EffectOrigin, EffectTemplate, FlagData, Insertion};
use crate::engine::CombatEngine;
use crate::state::{EntityId, ItemId, ResourceKind};

/// Outcome of pulsing an entity's effects once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PulseReport {
    /// Keys removed because their duration ran out.
    pub expired: Vec<EffectKey>,
    /// Health lost to damage-over-time effects.
    pub damage_taken: u32,
    pub defeated: bool,
}

impl<'a> CombatEngine<'a> {
    /// Attaches an effect built from `template` to `target`.
    ///
    /// Returns `None` when the target does not exist.
    pub fn apply_effect(
        &mut self,
        target: EntityId,
        template: &EffectTemplate,
        source: Option<EntityId>,
        origin: EffectOrigin,
    ) -> Option<Insertion> {
        self.world().entity(target)?;

        self.apply_cross_rules(target, &template.key);

        let id = self.world_mut().next_effect_id();
        let instance = template.instantiate(id, source, target, origin);
        let insertion = self.world_mut().entity_mut(target)?.effects.insert(instance);

        if let Insertion::Added(_) = insertion
            && !template.key.is_silent()
        {
            self.tell(target, format!("You are affected by {}.", template.key));
        }
        debug!(target = %target, key = %template.key, ?insertion, "effect applied");

        if template.key == EffectKey::CEASEFIRE && matches!(template.kind, EffectKind::Flag(FlagData::Plain)) {
            self.propagate_ceasefire(target, template, source, origin);
        }
        if matches!(template.kind, EffectKind::StatMod { .. }) {
            self.clamp_pools(target);
        }
        Some(insertion)
    }

    fn apply_cross_rules(&mut self, target: EntityId, key: &EffectKey) {
        let name = self.name(target);
        if *key == EffectKey::BURNING && self.remove_effect(target, &EffectKey::FROZEN).is_some() {
            self.say_near(target, format!("The ice around {name} melts away as {name} thaws."));
        } else if *key == EffectKey::FROZEN && self.remove_effect(target, &EffectKey::BURNING).is_some()
        {
            self.say_near(target, format!("The flames on {name} are smothered by frost."));
        }
    }

    /// Gives every other combatant around `origin` a longer, silent copy of
    /// its ceasefire. The copies end when the origin's ceasefire ends.
    fn propagate_ceasefire(
        &mut self,
        origin_entity: EntityId,
        template: &EffectTemplate,
        source: Option<EntityId>,
        origin: EffectOrigin,
    ) {
        let Some(room) = self.room_of(origin_entity) else {
            return;
        };
        let others: Vec<EntityId> = match self.world().battle(room) {
            Some(record) => record.order.clone(),
            None => self
                .world()
                .rooms
                .get(room)
                .map(|room| room.occupants.clone())
                .unwrap_or_default(),
        };

        let echo = EffectTemplate {
            kind: EffectKind::Flag(FlagData::Echo {
                origin: origin_entity,
            }),
            duration: template.duration.map(|secs| secs.saturating_mul(2)),
            ..template.clone()
        };

        for other in others.into_iter().filter(|id| *id != origin_entity) {
            let Some(record) = self.world().entity(other) else {
                continue;
            };
            // An entity holding its own ceasefire keeps it.
            if record
                .effects
                .get(&EffectKey::CEASEFIRE)
                .is_some_and(|existing| existing.echo_origin().is_none())
            {
                continue;
            }
            let id = self.world_mut().next_effect_id();
            let instance = echo.instantiate(id, source, other, origin);
            if let Some(record) = self.world_mut().entity_mut(other) {
                record.effects.insert(instance);
            }
        }
    }

    /// Removes the effect with `key` from `entity`. Absent keys are a no-op.
    pub fn remove_effect(&mut self, entity: EntityId, key: &EffectKey) -> Option<EffectInstance> {
        let removed = self.world_mut().entity_mut(entity)?.effects.remove(key)?;
        self.after_removal(&removed);
        Some(removed)
    }

    /// Removes every effect created by `source`, on every entity.
    ///
    /// Permanent effects such as gear passives are left alone.
    pub fn dispel(&mut self, source: EntityId) -> usize {
        let ids: Vec<EntityId> = self.world().entities.ids().collect();
        let mut count = 0;
        for entity in ids {
            let removed = match self.world_mut().entity_mut(entity) {
                Some(record) => record.effects.clear_from_source(source),
                None => continue,
            };
            count += removed.len();
            for instance in &removed {
                self.after_removal(instance);
            }
        }
        count
    }

    /// Drops passives granted by `item` from `entity`.
    pub(crate) fn remove_item_effects(&mut self, entity: EntityId, item: ItemId) {
        let removed = match self.world_mut().entity_mut(entity) {
            Some(record) => record.effects.clear_from_item(item),
            None => return,
        };
        for instance in &removed {
            self.after_removal(instance);
        }
    }

    /// Clears every timed effect, as on defeat.
    pub(crate) fn clear_timed_effects(&mut self, entity: EntityId) {
        let removed = match self.world_mut().entity_mut(entity) {
            Some(record) => record.effects.clear_timed(),
            None => return,
        };
        for instance in &removed {
            self.after_removal(instance);
        }
    }

    fn after_removal(&mut self, instance: &EffectInstance) {
        if instance.key == EffectKey::CEASEFIRE && instance.echo_origin().is_none() {
            self.end_ceasefire_echoes(instance.target);
        }
        if matches!(instance.kind, EffectKind::StatMod { .. }) {
            self.clamp_pools(instance.target);
        }
    }

    fn end_ceasefire_echoes(&mut self, origin: EntityId) {
        let ids: Vec<EntityId> = self.world().entities.ids().collect();
        let mut ended = Vec::new();
        for entity in ids {
            let Some(record) = self.world_mut().entity_mut(entity) else {
                continue;
            };
            let removed = record.effects.remove_where(|effect| {
                effect.key == EffectKey::CEASEFIRE && effect.echo_origin() == Some(origin)
            });
            if !removed.is_empty() {
                ended.push(entity);
            }
        }
        if !ended.is_empty() {
            self.say_near(origin, "The ceasefire ends.");
        }
    }

    /// Runs one application of every effect on `entity`, in creation order.
    ///
    /// `secs` is how much time the pulse stands for and `multiplier` scales
    /// rolled amounts: one second and ×1 outside a battle, one turn and
    /// ×`secs_per_turn` inside it.
    pub fn pulse_effects(&mut self, entity: EntityId, secs: u32, multiplier: u32) -> PulseReport {
        let mut report = PulseReport::default();
        let Some(ids) = self.world().entity(entity).map(|record| record.effects.ids()) else {
            return report;
        };

        for id in ids {
            let Some(instance) = self
                .world()
                .entity(entity)
                .and_then(|record| record.effects.get_by_id(id))
                .cloned()
            else {
                continue;
            };

            match &instance.kind {
                EffectKind::DamageOverTime(range) => {
                    let amount = self.roll(range.min, range.max).saturating_mul(multiplier);
                    let name = self.name(entity);
                    self.say_near(
                        entity,
                        format!(
                            "{name} takes {amount} {} damage from {}.",
                            range.damage_type, instance.key
                        ),
                    );
                    report.damage_taken += amount;
                    if self.deal_damage(entity, amount, instance.source) {
                        report.defeated = true;
                        return report;
                    }
                }
                EffectKind::Drain { resource, min, max } => {
                    let amount = self.roll(*min, *max).saturating_mul(multiplier);
                    let lost = self
                        .world_mut()
                        .entity_mut(entity)
                        .map(|record| record.pool_mut(*resource).drain(amount))
                        .unwrap_or(0);
                    if lost > 0 {
                        self.tell(entity, format!("{} drains {lost} {resource} from you.", instance.key));
                    }
                    if *resource == ResourceKind::Hp && lost > 0 && self.hp_is_zero(entity) {
                        self.defeat(entity, instance.source);
                        report.defeated = true;
                        return report;
                    }
                }
                EffectKind::Regeneration { resource, min, max } => {
                    let amount = self.roll(*min, *max).saturating_mul(multiplier);
                    let gained = self.restore(entity, *resource, amount);
                    if gained > 0 {
                        self.tell(entity, format!("You regain {gained} {resource}."));
                    }
                }
                EffectKind::StatMod { .. } | EffectKind::Flag(_) => {}
            }

            let expired = match self
                .world_mut()
                .entity_mut(entity)
                .and_then(|record| record.effects.get_by_id_mut(id))
            {
                Some(live) => {
                    live.advance(secs);
                    live.is_expired()
                }
                None => false,
            };
            if !expired {
                continue;
            }

            let Some(removed) = self
                .world_mut()
                .entity_mut(entity)
                .and_then(|record| record.effects.remove_id(id))
            else {
                continue;
            };
            if !removed.key.is_silent() && removed.echo_origin().is_none() {
                self.tell(entity, format!("{} wears off.", removed.key));
            }
            report.expired.push(removed.key.clone());
            self.after_removal(&removed);
        }
        report
    }

    fn hp_is_zero(&self, entity: EntityId) -> bool {
        self.world()
            .entity(entity)
            .is_some_and(|record| record.hp.current == 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::effect::{EffectKey, EffectKind, EffectOrigin, EffectTemplate, StatTarget};
    use crate::state::{Attribute, DamageRange, DamageType, ResourceKind};
    use crate::testing::Fixture;

    fn burning(secs: u32) -> EffectTemplate {
        EffectTemplate::new(
            EffectKey::BURNING,
            EffectKind::DamageOverTime(DamageRange::new(DamageType::Fire, 1, 1)),
            Some(secs),
        )
    }

    #[test]
    fn burning_thaws_frozen_target() {
        let mut fixture = Fixture::new();
        let target = fixture.character("Ann");
        let mut engine = fixture.engine();

        let frozen = EffectTemplate::new(EffectKey::FROZEN, EffectKind::flag(), Some(6));
        engine.apply_effect(target, &frozen, None, EffectOrigin::Ability);
        engine.apply_effect(target, &burning(9), None, EffectOrigin::Ability);

        let record = engine.world().entity(target).unwrap();
        assert!(!record.effects.has(&EffectKey::FROZEN));
        assert!(record.effects.has(&EffectKey::BURNING));
        assert!(engine.world().outbox.transcript().contains("thaws"));

        let hp = record.hp.current;
        let report = engine.pulse_effects(target, 1, 1);
        assert_eq!(report.damage_taken, 1);
        assert_eq!(engine.world().entity(target).unwrap().hp.current, hp - 1);
    }

    #[test]
    fn frozen_extinguishes_burning() {
        let mut fixture = Fixture::new();
        let target = fixture.character("Ann");
        let mut engine = fixture.engine();

        engine.apply_effect(target, &burning(9), None, EffectOrigin::Ability);
        let frozen = EffectTemplate::new(EffectKey::FROZEN, EffectKind::flag(), Some(6));
        engine.apply_effect(target, &frozen, None, EffectOrigin::Ability);

        let effects = &engine.world().entity(target).unwrap().effects;
        assert!(effects.has(&EffectKey::FROZEN));
        assert!(!effects.has(&EffectKey::BURNING));
    }

    #[test]
    fn effect_is_removed_on_first_pulse_reaching_duration() {
        let mut fixture = Fixture::new();
        let target = fixture.character("Ann");
        let mut engine = fixture.engine();
        let blind = EffectTemplate::new(EffectKey::BLINDED, EffectKind::flag(), Some(3));
        engine.apply_effect(target, &blind, None, EffectOrigin::Ability);

        assert!(engine.pulse_effects(target, 1, 1).expired.is_empty());
        assert!(engine.pulse_effects(target, 1, 1).expired.is_empty());
        let report = engine.pulse_effects(target, 1, 1);
        assert_eq!(report.expired, vec![EffectKey::BLINDED]);
        assert!(engine.world().outbox.transcript().contains("Blinded wears off."));
    }

    #[test]
    fn knockdown_wears_off_silently() {
        let mut fixture = Fixture::new();
        let target = fixture.character("Ann");
        let mut engine = fixture.engine();
        let down = EffectTemplate::new(EffectKey::KNOCKED_DOWN, EffectKind::flag(), Some(1));
        engine.apply_effect(target, &down, None, EffectOrigin::Ability);
        engine.pulse_effects(target, 3, 3);

        assert!(!engine.has_effect(target, &EffectKey::KNOCKED_DOWN));
        assert!(!engine.world().outbox.transcript().contains("Knocked Down"));
    }

    #[test]
    fn ceasefire_echoes_end_with_the_origin() {
        let mut fixture = Fixture::new();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let mut engine = fixture.engine();
        let ceasefire = EffectTemplate::new(EffectKey::CEASEFIRE, EffectKind::flag(), Some(6));

        engine.apply_effect(ann, &ceasefire, Some(ann), EffectOrigin::Ability);
        engine.apply_effect(ann, &ceasefire, Some(ann), EffectOrigin::Ability);

        let echo = engine
            .world()
            .entity(rat)
            .unwrap()
            .effects
            .get(&EffectKey::CEASEFIRE)
            .cloned()
            .unwrap();
        assert_eq!(echo.echo_origin(), Some(ann));
        assert_eq!(echo.duration, Some(12));
        let origin = engine.world().entity(ann).unwrap().effects.get(&EffectKey::CEASEFIRE).cloned().unwrap();
        assert_eq!(origin.duration, Some(6));
        assert_eq!(origin.stacks, 1);

        for _ in 0..6 {
            engine.pulse_effects(ann, 1, 1);
        }
        assert!(!engine.has_effect(ann, &EffectKey::CEASEFIRE));
        assert!(!engine.has_effect(rat, &EffectKey::CEASEFIRE));
    }

    #[test]
    fn lowering_max_health_clamps_current() {
        let mut fixture = Fixture::new();
        let ann = fixture.character("Ann");
        let mut engine = fixture.engine();
        let before = engine.world().entity(ann).unwrap().hp.current;

        let sap = EffectTemplate::new(
            "Withering",
            EffectKind::stat(StatTarget::MaxResource(ResourceKind::Hp), -5),
            Some(10),
        );
        engine.apply_effect(ann, &sap, None, EffectOrigin::Ability);

        let after = engine.world().entity(ann).unwrap().hp.current;
        assert_eq!(after, before - 5);
    }

    #[test]
    fn dispel_removes_only_that_sources_effects() {
        let mut fixture = Fixture::new();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let mut engine = fixture.engine();
        let weak = EffectTemplate::new(
            "Weakness",
            EffectKind::stat(StatTarget::Attribute(Attribute::Strength), -2),
            Some(10),
        );
        let blind = EffectTemplate::new(EffectKey::BLINDED, EffectKind::flag(), Some(6));
        engine.apply_effect(ann, &weak, Some(rat), EffectOrigin::Ability);
        engine.apply_effect(ann, &blind, None, EffectOrigin::Environment);

        assert_eq!(engine.dispel(rat), 1);
        let effects = &engine.world().entity(ann).unwrap().effects;
        assert!(!effects.has(&"Weakness".into()));
        assert!(effects.has(&EffectKey::BLINDED));
    }
}
