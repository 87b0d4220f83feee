//! Combat resolution.
//!
//! # Architecture
//!
//! - `hit`: pure to-hit arithmetic
//! - `damage`: pure mitigation arithmetic plus the engine's strike and
//!   damage application
//! - `defeat`: what happens at zero health
//!
//! This module also hosts the weapon attack verb. Abilities share the damage
//! path but skip the hit roll; see [`crate::ability`].

mod damage;
mod defeat;
mod hit;

pub use damage::{DamagePart, Mitigation, Strike, damage_sentence, mitigate};
pub use hit::{HitRoll, attack_value, resolve_hit};

use tracing::debug;

use crate::effect::EffectKey;
use crate::engine::CombatEngine;
use crate::error::{BlockReason, CombatError, TargetIssue};
use crate::state::{DamageRange, DamageType, EntityId, EquipSlot, WeaponProfile};
use crate::turn::FightEntry;

/// What a weapon attack did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttackOutcome {
    Hit(Strike),
    Missed(HitRoll),
    /// The attacker joined a fight already under way and must wait for its
    /// turn.
    JoinedFight,
}

impl<'a> CombatEngine<'a> {
    /// Weapon (or unarmed) profile used by `entity`'s attacks.
    pub fn weapon_of(&self, entity: EntityId) -> WeaponProfile {
        let config = self.config();
        self.world()
            .entity(entity)
            .and_then(|record| record.equipment.get(EquipSlot::Primary))
            .and_then(|item| self.world().item(item))
            .and_then(|item| item.weapon())
            .cloned()
            .unwrap_or_else(|| WeaponProfile {
                damage: vec![DamageRange::new(
                    DamageType::Blunt,
                    config.unarmed_damage_min,
                    config.unarmed_damage_max,
                )],
                accuracy_bonus: 0,
                ap_to_attack: config.unarmed_ap,
                range: 1,
            })
    }

    /// Attacks `target` with the attacker's weapon.
    ///
    /// Outside a battle this starts one with the attacker first in the turn
    /// order and then resolves the attack as its opening action.
    pub fn attack(
        &mut self,
        attacker: EntityId,
        target: EntityId,
    ) -> Result<AttackOutcome, CombatError> {
        self.validate_offense(attacker, target)?;
        if self.on_swarm_tile(attacker) {
            return Err(CombatError::ActionBlocked(BlockReason::Swarm));
        }

        if !self.is_in_combat(attacker) {
            let reach = self.weapon_of(attacker).range;
            if let FightEntry::Joined = self.start_or_join_fight(attacker, target, reach)? {
                return Ok(AttackOutcome::JoinedFight);
            }
        }
        self.attack_in_battle(attacker, target)
    }

    /// Checks shared by every offensive verb, before any state changes.
    pub(crate) fn validate_offense(
        &self,
        attacker: EntityId,
        target: EntityId,
    ) -> Result<(), CombatError> {
        let record = self
            .world()
            .entity(attacker)
            .ok_or(CombatError::UnknownEntity(attacker))?;
        if !record.is_standing() {
            return Err(CombatError::ActionBlocked(BlockReason::Incapacitated));
        }
        let victim = self
            .world()
            .entity(target)
            .ok_or(CombatError::InvalidTarget(TargetIssue::NotFound))?;
        if attacker == target {
            return Err(CombatError::InvalidTarget(TargetIssue::Yourself));
        }
        if victim.location.is_none() || victim.location != record.location {
            return Err(CombatError::InvalidTarget(TargetIssue::NotHere));
        }
        if !victim.is_standing() {
            return Err(CombatError::InvalidTarget(TargetIssue::Defeated));
        }
        if record.effects.has(&EffectKey::FROZEN) {
            return Err(CombatError::ActionBlocked(BlockReason::Frozen));
        }
        if record.effects.has(&EffectKey::CEASEFIRE) {
            return Err(CombatError::ActionBlocked(BlockReason::Ceasefire));
        }
        if !self.is_in_combat(attacker) && record.effects.has(&EffectKey::KNOCKED_DOWN) {
            return Err(CombatError::ActionBlocked(BlockReason::KnockedDown));
        }
        if self.is_in_combat(attacker) && !self.is_in_combat(target) {
            return Err(CombatError::InvalidTarget(TargetIssue::NotInFight));
        }
        Ok(())
    }

    fn attack_in_battle(
        &mut self,
        attacker: EntityId,
        target: EntityId,
    ) -> Result<AttackOutcome, CombatError> {
        let room = self
            .world()
            .battle_room_of(attacker)
            .ok_or(CombatError::NotInCombat)?;
        if !self.is_turn(attacker) {
            return Err(CombatError::TurnGated);
        }
        let weapon = self.weapon_of(attacker);
        let record = self.world().battle(room).ok_or(CombatError::NotInCombat)?;
        if !record.contains(target) {
            return Err(CombatError::InvalidTarget(TargetIssue::NotInFight));
        }
        let distance = record.grid.distance(attacker, target).unwrap_or(u32::MAX);
        if distance > weapon.range {
            return Err(CombatError::OutOfRange);
        }
        let available = record.ap(attacker);
        if available < weapon.ap_to_attack {
            return Err(CombatError::NotEnoughActionPoints {
                needed: weapon.ap_to_attack,
                available,
            });
        }

        let outcome = self.resolve_attack(attacker, target, &weapon);
        self.finish_action(room, attacker, weapon.ap_to_attack);
        Ok(outcome)
    }

    /// Hit roll, damage and announcements of one weapon attack.
    pub(crate) fn resolve_attack(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        weapon: &WeaponProfile,
    ) -> AttackOutcome {
        let accuracy = self
            .stats(attacker)
            .map(|stats| stats.accuracy)
            .unwrap_or(0);
        let evasion = self.stats(target).map(|stats| stats.evasion).unwrap_or(0);
        let blinded = self.has_effect(attacker, &EffectKey::BLINDED);
        let roll = self.roll(1, 100);
        let hit = resolve_hit(roll, weapon.accuracy_bonus, accuracy, blinded, evasion);
        debug!(%attacker, %target, ?hit, "attack rolled");

        let (name, victim) = (self.name(attacker), self.name(target));
        if !hit.hit {
            self.say_near(attacker, format!("{name} attacks {victim} and misses."));
            return AttackOutcome::Missed(hit);
        }
        self.say_near(attacker, format!("{name} hits {victim}!"));
        AttackOutcome::Hit(self.strike(attacker, target, &weapon.damage, Mitigation::Defense))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::effect::{EffectKind, EffectOrigin, EffectTemplate};
    use crate::state::{EntityId, Gear};
    use crate::testing::Fixture;

    fn arm(fixture: &mut Fixture, owner: EntityId, min: u32, max: u32, range: u32) {
        let mut template = Fixture::template("Club");
        template.gear = Some(Gear {
            weapon: Some(WeaponProfile {
                damage: vec![DamageRange::new(DamageType::Blunt, min, max)],
                accuracy_bonus: 0,
                ap_to_attack: 1,
                range,
            }),
            ..Gear::new(EquipSlot::Primary)
        });
        let club = fixture.give(owner, &template);
        fixture.engine().equip(owner, club).unwrap();
    }

    #[test]
    fn knocked_down_defender_takes_half_again() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        arm(&mut fixture, ann, 10, 10, 1);
        let mut engine = fixture.engine();
        let down = EffectTemplate::new(EffectKey::KNOCKED_DOWN, EffectKind::flag(), Some(6));
        engine.apply_effect(rat, &down, Some(ann), EffectOrigin::Ability);

        let outcome = engine.attack(ann, rat).unwrap();

        let AttackOutcome::Hit(strike) = outcome else {
            panic!("expected a hit, got {outcome:?}");
        };
        assert_eq!(strike.total, 15);
        assert_eq!(engine.world().entity(rat).unwrap().hp.current, 25);
        assert!(engine.world().outbox.transcript().contains("Rat takes 15 blunt damage."));
    }

    #[test]
    fn weapon_attack_costs_its_action_points() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        arm(&mut fixture, ann, 2, 2, 1);
        let room = fixture.room;
        let mut engine = fixture.engine();

        engine.attack(ann, rat).unwrap();
        assert_eq!(engine.world().battle(room).unwrap().ap(ann), 1);
        engine.attack(ann, rat).unwrap();

        assert!(engine.is_turn(rat));
        assert_eq!(engine.world().entity(rat).unwrap().hp.current, 36);
        assert_eq!(engine.attack(ann, rat), Err(CombatError::TurnGated));
    }

    #[test]
    fn entity_action_points_replace_the_default() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.world.entity_mut(ann).unwrap().ap_per_turn = Some(3);
        arm(&mut fixture, ann, 2, 2, 1);
        let room = fixture.room;
        let mut engine = fixture.engine();

        engine.attack(ann, rat).unwrap();
        assert_eq!(engine.world().battle(room).unwrap().ap(ann), 2);
        engine.attack(ann, rat).unwrap();
        engine.attack(ann, rat).unwrap();

        assert!(engine.is_turn(rat));
        assert_eq!(engine.world().entity(rat).unwrap().hp.current, 34);
        assert_eq!(
            engine.world().battle(room).unwrap().ap(rat),
            CombatConfig::DEFAULT_AP
        );
    }

    #[test]
    fn swarm_under_the_attacker_blocks_weapon_attacks() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let room = fixture.room;
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 1).unwrap();
        Fixture::swarm_under(&mut engine, ann);

        assert_eq!(
            engine.attack(ann, rat),
            Err(CombatError::ActionBlocked(BlockReason::Swarm))
        );
        assert_eq!(engine.world().battle(room).unwrap().ap(ann), CombatConfig::DEFAULT_AP);
        assert!(engine.is_turn(ann));
    }

    #[test]
    fn reach_limits_weapon_attacks() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 4).unwrap();

        assert_eq!(engine.attack(ann, rat), Err(CombatError::OutOfRange));
    }

    #[test]
    fn ceasefire_blocks_the_attacker() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let mut engine = fixture.engine();
        let truce = EffectTemplate::new(EffectKey::CEASEFIRE, EffectKind::flag(), Some(10));
        engine.apply_effect(ann, &truce, None, EffectOrigin::Ability);

        assert_eq!(
            engine.attack(ann, rat),
            Err(CombatError::ActionBlocked(BlockReason::Ceasefire))
        );
        assert!(!engine.is_in_combat(ann));
    }

    #[test]
    fn unarmed_profile_comes_from_config() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let engine = fixture.engine();

        let unarmed = engine.weapon_of(ann);
        assert_eq!(unarmed.range, 1);
        assert_eq!(unarmed.ap_to_attack, CombatConfig::UNARMED_AP);
        assert_eq!(unarmed.damage, vec![DamageRange::new(DamageType::Blunt, 1, 3)]);
    }
}
