//! Checking and committing ability casts.

use tracing::{debug, info, warn};

use super::{AbilityDescriptor, AbilityKey, AbilityRole, AbilityTarget, Targeting};
use crate::combat::Mitigation;
use crate::effect::{EffectKey, EffectOrigin};
use crate::engine::CombatEngine;
use crate::error::{BlockReason, CombatError, Remaining, TargetIssue};
use crate::grid::{TileEffect, tiles_for};
use crate::state::{EntityId, ItemId, ItemLocation, ResourceKind};
use crate::turn::FightEntry;

/// A cast that passed every check, ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastPlan {
    pub ability: AbilityKey,
    pub target: AbilityTarget,
    /// Component items chosen for consumption, one per requirement.
    pub components: Vec<ItemId>,
}

/// What a committed cast did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastOutcome {
    pub target: Option<EntityId>,
    pub damage: u32,
    pub healed: u32,
    pub defeated: Vec<EntityId>,
    /// Set when the cast opened or joined a fight.
    pub fight: Option<FightEntry>,
}

impl<'a> CombatEngine<'a> {
    /// Runs every check of the cast pipeline without changing state.
    ///
    /// A [`Targeting::SelfOnly`] ability ignores `target` and aims at the
    /// caster. The returned plan names the component items a cast would
    /// consume.
    pub fn check_ability(
        &self,
        caster: EntityId,
        key: &AbilityKey,
        target: AbilityTarget,
    ) -> Result<CastPlan, CombatError> {
        let descriptor = self
            .env()
            .ability(key)
            .ok_or_else(|| CombatError::UnknownAbility(key.clone()))?;
        let record = self
            .world()
            .entity(caster)
            .ok_or(CombatError::UnknownEntity(caster))?;
        if !record.knows(key) {
            return Err(CombatError::NotLearned(key.clone()));
        }
        if !record.is_standing() {
            return Err(CombatError::ActionBlocked(BlockReason::Incapacitated));
        }
        let in_battle = self.is_in_combat(caster);
        if in_battle && !self.is_turn(caster) {
            return Err(CombatError::TurnGated);
        }
        if record.effects.has(&EffectKey::FROZEN) {
            return Err(CombatError::ActionBlocked(BlockReason::Frozen));
        }
        if descriptor.offensive && record.effects.has(&EffectKey::CEASEFIRE) {
            return Err(CombatError::ActionBlocked(BlockReason::Ceasefire));
        }
        if descriptor.offensive && self.on_swarm_tile(caster) {
            return Err(CombatError::ActionBlocked(BlockReason::Swarm));
        }

        if let Some(cost) = descriptor.cost
            && record.pool(cost.resource).current < cost.amount
        {
            return Err(CombatError::InsufficientResource(cost.resource));
        }

        let cooldown = record.cooldown(key);
        if cooldown > 0 && !record.elevated {
            let remaining = if in_battle {
                Remaining::Turns(self.config().secs_to_turns(cooldown))
            } else {
                Remaining::Seconds(cooldown)
            };
            return Err(CombatError::OnCooldown {
                ability: key.clone(),
                remaining,
            });
        }

        let target = self.resolve_target(caster, descriptor, target)?;
        let components = self.choose_components(caster, descriptor)?;

        if in_battle {
            let available = self
                .world()
                .battle_room_of(caster)
                .and_then(|room| self.world().battle(room))
                .map(|record| record.ap(caster))
                .unwrap_or(0);
            if available < descriptor.ap_cost {
                return Err(CombatError::NotEnoughActionPoints {
                    needed: descriptor.ap_cost,
                    available,
                });
            }
        }

        Ok(CastPlan {
            ability: key.clone(),
            target,
            components,
        })
    }

    fn resolve_target(
        &self,
        caster: EntityId,
        descriptor: &AbilityDescriptor,
        target: AbilityTarget,
    ) -> Result<AbilityTarget, CombatError> {
        match descriptor.targeting {
            Targeting::SelfOnly => Ok(AbilityTarget::Entity(caster)),
            Targeting::None => Ok(AbilityTarget::None),
            Targeting::Entity => {
                let Some(id) = target.entity() else {
                    return Err(CombatError::InvalidTarget(TargetIssue::Missing));
                };
                let victim = self
                    .world()
                    .entity(id)
                    .ok_or(CombatError::InvalidTarget(TargetIssue::NotFound))?;
                if victim.location.is_none() || victim.location != self.room_of(caster) {
                    return Err(CombatError::InvalidTarget(TargetIssue::NotHere));
                }
                if id == caster && !descriptor.targets_self() {
                    return Err(CombatError::InvalidTarget(TargetIssue::Yourself));
                }
                match descriptor.role {
                    AbilityRole::Revive if victim.is_standing() => {
                        return Err(CombatError::InvalidTarget(TargetIssue::NotDefeated));
                    }
                    AbilityRole::Revive => {}
                    _ if descriptor.must_target_living && !victim.is_standing() => {
                        return Err(CombatError::InvalidTarget(TargetIssue::Defeated));
                    }
                    _ => {}
                }
                if let Some(room) = self.world().battle_room_of(caster)
                    && let Some(record) = self.world().battle(room)
                    && let Some(distance) = record.grid.distance(caster, id)
                    && distance > descriptor.range
                {
                    return Err(CombatError::OutOfRange);
                }
                Ok(AbilityTarget::Entity(id))
            }
            Targeting::Tile => {
                let AbilityTarget::Tile(cell) = target else {
                    return Err(CombatError::InvalidTarget(TargetIssue::Missing));
                };
                let record = self
                    .world()
                    .battle_room_of(caster)
                    .and_then(|room| self.world().battle(room))
                    .ok_or(CombatError::NotInCombat)?;
                if !record.grid.contains(cell) {
                    return Err(CombatError::InvalidTarget(TargetIssue::OffGrid));
                }
                let from = record
                    .grid
                    .coordinates(caster)
                    .ok_or(CombatError::NotInCombat)?;
                if from.chebyshev(cell) > descriptor.range {
                    return Err(CombatError::OutOfRange);
                }
                Ok(AbilityTarget::Tile(cell))
            }
        }
    }

    /// Picks, for each requirement, the weakest carried item that still
    /// meets it. One item never satisfies two requirements.
    fn choose_components(
        &self,
        caster: EntityId,
        descriptor: &AbilityDescriptor,
    ) -> Result<Vec<ItemId>, CombatError> {
        let Some(record) = self.world().entity(caster) else {
            return Err(CombatError::UnknownEntity(caster));
        };
        let mut chosen: Vec<ItemId> = Vec::with_capacity(descriptor.components.len());
        for requirement in &descriptor.components {
            let best = record
                .inventory
                .iter()
                .filter(|id| !chosen.contains(id))
                .filter_map(|id| {
                    let strength = self.world().item(*id)?.component_strength(requirement.kind)?;
                    (strength >= requirement.strength).then_some((*id, strength))
                })
                .min_by_key(|(id, strength)| (*strength, *id));
            match best {
                Some((item, _)) => chosen.push(item),
                None => return Err(CombatError::MissingComponent(requirement.kind)),
            }
        }
        Ok(chosen)
    }

    /// Checks and commits a cast.
    ///
    /// Offensive casts outside a battle open one (or join the one in the
    /// room) after resolving, unless the target fell to the cast itself.
    pub fn cast(
        &mut self,
        caster: EntityId,
        key: &AbilityKey,
        target: AbilityTarget,
    ) -> Result<CastOutcome, CombatError> {
        let plan = self.check_ability(caster, key, target)?;
        let Some(descriptor) = self.env().ability(key) else {
            return Err(CombatError::UnknownAbility(key.clone()));
        };
        let battle_room = self.world().battle_room_of(caster);
        let target_id = plan.target.entity();

        if descriptor.offensive
            && battle_room.is_some()
            && let Some(victim) = target_id
            && !self.is_in_combat(victim)
        {
            return Err(CombatError::InvalidTarget(TargetIssue::NotInFight));
        }

        self.pay_for_cast(caster, descriptor, &plan);

        let name = self.name(caster);
        self.say_near(caster, format!("{name} casts {}.", descriptor.name));
        info!(%caster, ability = %key, target = ?plan.target, "cast");

        let mut outcome = CastOutcome {
            target: target_id,
            ..CastOutcome::default()
        };

        if let Some(victim) = target_id {
            self.resolve_on_entity(caster, victim, descriptor, &mut outcome);
        }
        if let AbilityTarget::Tile(center) = plan.target
            && let Some(area) = &descriptor.area
            && let Some(room) = battle_room
        {
            let from = self
                .world()
                .battle(room)
                .and_then(|record| record.grid.coordinates(caster))
                .unwrap_or(center);
            let cells = tiles_for(from, center, area.length, area.width);
            let tile = TileEffect::from_template(&area.tile, Some(caster), cells);
            self.lay_tile(room, tile);
        }

        if let Some(room) = battle_room {
            self.finish_action(room, caster, descriptor.ap_cost);
        } else if descriptor.offensive
            && let Some(victim) = target_id
            && victim != caster
            && self.is_standing(victim)
            && self.is_standing(caster)
        {
            match self.start_or_join_fight(caster, victim, descriptor.range) {
                Ok(entry) => outcome.fight = Some(entry),
                Err(error) => warn!(%caster, %victim, %error, "cast could not open a fight"),
            }
        }
        Ok(outcome)
    }

    fn pay_for_cast(&mut self, caster: EntityId, descriptor: &AbilityDescriptor, plan: &CastPlan) {
        if let Some(record) = self.world_mut().entity_mut(caster) {
            if let Some(cost) = descriptor.cost {
                record.pool_mut(cost.resource).drain(cost.amount);
            }
            if descriptor.cooldown > 0 {
                record
                    .cooldowns
                    .insert(descriptor.key.clone(), descriptor.cooldown);
            }
        }
        for item in &plan.components {
            let consumed = self
                .world()
                .item(*item)
                .filter(|item| item.location == ItemLocation::Carried(caster))
                .map(|item| item.name.clone());
            if let Some(consumed) = consumed {
                self.tell(caster, format!("{consumed} is consumed."));
                self.remove_item_effects(caster, *item);
                self.world_mut().delete_item(*item);
            }
        }
    }

    fn resolve_on_entity(
        &mut self,
        caster: EntityId,
        victim: EntityId,
        descriptor: &AbilityDescriptor,
        outcome: &mut CastOutcome,
    ) {
        match descriptor.role {
            AbilityRole::Heal { min, max } => {
                let amount = self.roll(min, max);
                outcome.healed = self.restore(victim, ResourceKind::Hp, amount);
                let name = self.name(victim);
                self.say_near(victim, format!("{name} recovers {} health.", outcome.healed));
            }
            AbilityRole::Revive => {
                let max = self.stats(victim).map(|stats| stats.max_hp).unwrap_or(1);
                if let Some(record) = self.world_mut().entity_mut(victim) {
                    record.knocked_out = false;
                    record.hp.current = (max / 4).max(1);
                }
                let name = self.name(victim);
                self.say_near(victim, format!("{name} gets back up."));
            }
            AbilityRole::Standard => {}
        }

        if !descriptor.damage.is_empty() {
            let strike = self.strike(caster, victim, &descriptor.damage, Mitigation::Resistance);
            outcome.damage = strike.total;
            if strike.defeated {
                outcome.defeated.push(victim);
                return;
            }
        }
        for effect in &descriptor.effects {
            if !self.is_standing(victim) && descriptor.role != AbilityRole::Revive {
                break;
            }
            self.apply_effect(victim, effect, Some(caster), EffectOrigin::Ability);
        }
        debug!(%caster, %victim, damage = outcome.damage, "cast resolved on entity");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AreaSpec, ComponentRequirement, ResourceCost};
    use crate::effect::{EffectKind, EffectTemplate};
    use crate::grid::{TileApply, TileTemplate};
    use crate::state::{ComponentKind, DamageRange, DamageType, Position};
    use crate::testing::Fixture;

    fn fireball() -> AbilityDescriptor {
        AbilityDescriptor {
            cost: Some(ResourceCost {
                resource: ResourceKind::Mana,
                amount: 10,
            }),
            cooldown: 6,
            offensive: true,
            range: 5,
            damage: vec![DamageRange::new(DamageType::Fire, 5, 5)],
            effects: vec![EffectTemplate::new(
                EffectKey::BURNING,
                EffectKind::DamageOverTime(DamageRange::new(DamageType::Fire, 1, 1)),
                Some(9),
            )],
            ..AbilityDescriptor::new("fireball", "Fireball")
        }
    }

    fn venom_ward() -> AbilityDescriptor {
        AbilityDescriptor {
            targeting: Targeting::SelfOnly,
            components: vec![ComponentRequirement {
                kind: ComponentKind::Poison,
                strength: 3,
            }],
            ..AbilityDescriptor::new("venom_ward", "Venom Ward")
        }
    }

    fn hemlock(fixture: &mut Fixture, owner: EntityId, strength: u32) -> ItemId {
        let mut template = Fixture::template("Hemlock");
        template.components.insert(ComponentKind::Poison, strength);
        fixture.give(owner, &template)
    }

    #[test]
    fn offensive_cast_opens_a_fight() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.learn(ann, fireball());
        let mut engine = fixture.engine();

        let outcome = engine
            .cast(ann, &"fireball".into(), AbilityTarget::Entity(rat))
            .unwrap();

        assert_eq!(outcome.fight, Some(FightEntry::Started));
        assert_eq!(outcome.damage, 5);
        let rat_record = engine.world().entity(rat).unwrap();
        assert_eq!(rat_record.hp.current, 35);
        assert!(rat_record.effects.has(&EffectKey::BURNING));
        assert_eq!(engine.world().entity(ann).unwrap().mana.current, 90);
        assert!(engine.is_turn(ann));
    }

    #[test]
    fn cooldown_is_reported_in_turns_and_expires() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.learn(ann, fireball());
        let key = AbilityKey::from("fireball");
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 3).unwrap();

        engine.cast(ann, &key, AbilityTarget::Entity(rat)).unwrap();
        assert_eq!(
            engine.check_ability(ann, &key, AbilityTarget::Entity(rat)),
            Err(CombatError::OnCooldown {
                ability: key.clone(),
                remaining: Remaining::Turns(2),
            })
        );

        engine.pass_turn(ann).unwrap();
        engine.pass_turn(rat).unwrap();
        assert!(engine.check_ability(ann, &key, AbilityTarget::Entity(rat)).is_err());

        engine.pass_turn(ann).unwrap();
        engine.pass_turn(rat).unwrap();
        assert!(engine.is_turn(ann));
        assert!(engine.check_ability(ann, &key, AbilityTarget::Entity(rat)).is_ok());
    }

    #[test]
    fn swarm_blocks_offensive_casts_only() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.learn(ann, fireball());
        fixture.learn(
            ann,
            AbilityDescriptor {
                targeting: Targeting::SelfOnly,
                role: AbilityRole::Heal { min: 1, max: 1 },
                ..AbilityDescriptor::new("mend", "Mend")
            },
        );
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, 3).unwrap();
        Fixture::swarm_under(&mut engine, ann);

        assert_eq!(
            engine.check_ability(ann, &"fireball".into(), AbilityTarget::Entity(rat)),
            Err(CombatError::ActionBlocked(BlockReason::Swarm))
        );
        assert!(engine.check_ability(ann, &"mend".into(), AbilityTarget::None).is_ok());
    }

    #[test]
    fn weakest_sufficient_component_is_consumed() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        fixture.learn(ann, venom_ward());
        let strong = hemlock(&mut fixture, ann, 7);
        let weak = hemlock(&mut fixture, ann, 4);
        let too_weak = hemlock(&mut fixture, ann, 2);
        let key = AbilityKey::from("venom_ward");
        let mut engine = fixture.engine();

        let plan = engine.check_ability(ann, &key, AbilityTarget::None).unwrap();
        assert_eq!(plan.components, vec![weak]);
        assert_eq!(plan.target, AbilityTarget::Entity(ann));

        engine.cast(ann, &key, AbilityTarget::None).unwrap();

        assert!(engine.world().item(weak).is_none());
        assert!(engine.world().item(strong).is_some());
        let inventory = &engine.world().entity(ann).unwrap().inventory;
        assert!(inventory.contains(&strong) && inventory.contains(&too_weak));
        assert!(!inventory.contains(&weak));
    }

    #[test]
    fn missing_component_rejects_the_cast() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        fixture.learn(ann, venom_ward());
        hemlock(&mut fixture, ann, 2);
        let engine = fixture.engine();

        assert_eq!(
            engine.check_ability(ann, &"venom_ward".into(), AbilityTarget::None),
            Err(CombatError::MissingComponent(ComponentKind::Poison))
        );
    }

    #[test]
    fn checks_fail_in_pipeline_order() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.learn(ann, fireball());
        fixture.world.entity_mut(ann).unwrap().mana.current = 3;
        let key = AbilityKey::from("fireball");
        let engine = fixture.engine();

        assert_eq!(
            engine.check_ability(ann, &"unknown".into(), AbilityTarget::Entity(rat)),
            Err(CombatError::UnknownAbility("unknown".into()))
        );
        assert_eq!(
            engine.check_ability(rat, &key, AbilityTarget::Entity(ann)),
            Err(CombatError::NotLearned(key.clone()))
        );
        assert_eq!(
            engine.check_ability(ann, &key, AbilityTarget::Entity(rat)),
            Err(CombatError::InsufficientResource(ResourceKind::Mana))
        );
    }

    #[test]
    fn offensive_ability_cannot_target_the_caster() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        fixture.learn(ann, fireball());
        let engine = fixture.engine();

        assert_eq!(
            engine.check_ability(ann, &"fireball".into(), AbilityTarget::Entity(ann)),
            Err(CombatError::InvalidTarget(TargetIssue::Yourself))
        );
    }

    #[test]
    fn heal_restores_up_to_the_maximum() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        fixture.learn(
            ann,
            AbilityDescriptor {
                targeting: Targeting::SelfOnly,
                role: AbilityRole::Heal { min: 8, max: 8 },
                ..AbilityDescriptor::new("mend", "Mend")
            },
        );
        fixture.world.entity_mut(ann).unwrap().hp.current = 35;
        let mut engine = fixture.engine();

        let outcome = engine.cast(ann, &"mend".into(), AbilityTarget::None).unwrap();

        assert_eq!(outcome.healed, 5);
        assert_eq!(engine.world().entity(ann).unwrap().hp.current, 40);
    }

    #[test]
    fn tile_ability_lays_an_area_in_battle() {
        let mut fixture = Fixture::flat();
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        fixture.learn(
            ann,
            AbilityDescriptor {
                targeting: Targeting::Tile,
                offensive: true,
                range: 4,
                area: Some(AreaSpec {
                    length: 2,
                    width: 1,
                    tile: TileTemplate {
                        name: "web".into(),
                        apply: TileApply::SuppressAttacks,
                        duration: 9,
                    },
                }),
                ..AbilityDescriptor::new("web", "Web")
            },
        );
        let room = fixture.room;
        let mut engine = fixture.engine();

        assert_eq!(
            engine.check_ability(ann, &"web".into(), AbilityTarget::Tile(Position::new(1, 0))),
            Err(CombatError::NotInCombat)
        );
        engine.start_or_join_fight(ann, rat, 3).unwrap();
        engine
            .cast(ann, &"web".into(), AbilityTarget::Tile(Position::new(1, 0)))
            .unwrap();

        let record = engine.world().battle(room).unwrap();
        assert_eq!(record.grid.tiles().count(), 1);
        assert!(!record.grid.effects_at(Position::new(1, 0)).is_empty());
        assert_eq!(record.ap(ann), 1);
    }
}
