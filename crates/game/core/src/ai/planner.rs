//! Priority planner for AI combatants.
//!
//! The tree is a selector over five options, tried in order:
//!
//! ```text
//! Selector
//! ├── Flee               Afraid → step away from the fear's source
//! ├── Sequence
//! │   ├── IsHurt         health below the profile's threshold
//! │   └── Selector
//! │       ├── HealAbility
//! │       └── HealItem
//! ├── OffensiveAbility   uniform pick among castable offensive abilities
//! ├── WeaponAttack       attack in range, else approach
//! └── Pass
//! ```
//!
//! Nodes only decide. The engine executes the decision afterwards and
//! schedules the next one while the turn lasts.

use tracing::{debug, warn};

use super::behavior::{Behavior, Selector, Sequence, Status};
use crate::ability::{AbilityKey, AbilityTarget, Targeting};
use crate::config::CombatConfig;
use crate::effect::EffectKey;
use crate::engine::CombatEngine;
use crate::error::CombatError;
use crate::grid::Direction;
use crate::state::{EntityId, ItemId, RoomId};

/// One action chosen by the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Step(Direction),
    Cast {
        ability: AbilityKey,
        target: AbilityTarget,
    },
    UseItem {
        item: ItemId,
        target: EntityId,
    },
    Attack(EntityId),
    Pass,
}

/// Blackboard handed to planner nodes.
pub struct PlanContext<'e, 'a> {
    pub engine: &'e mut CombatEngine<'a>,
    pub entity: EntityId,
    pub room: RoomId,
    decision: Option<Decision>,
}

impl<'e, 'a> PlanContext<'e, 'a> {
    fn decide(&mut self, decision: Decision) -> Status {
        self.decision = Some(decision);
        Status::Success
    }

    fn has(&self, key: &EffectKey) -> bool {
        self.engine.has_effect(self.entity, key)
    }

    /// Standing combatants on the other side, in initiative order.
    fn opponents(&self) -> Vec<EntityId> {
        let side = self.engine.hostility(self.entity);
        self.engine
            .world()
            .battle(self.room)
            .map(|record| record.order.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.engine.is_standing(*id) && self.engine.hostility(*id) != side)
            .collect()
    }

    /// Uniform pick among opponents within `range`, else the nearest one.
    fn select_target(&mut self, range: u32) -> Option<EntityId> {
        let grid = &self.engine.world().battle(self.room)?.grid;
        let measured: Vec<(EntityId, u32)> = self
            .opponents()
            .into_iter()
            .filter_map(|id| Some((id, grid.distance(self.entity, id)?)))
            .collect();
        let in_range: Vec<EntityId> = measured
            .iter()
            .filter(|(_, distance)| *distance <= range)
            .map(|(id, _)| *id)
            .collect();
        if !in_range.is_empty() {
            let index = self.engine.pick(in_range.len())?;
            return in_range.get(index).copied();
        }
        measured
            .into_iter()
            .min_by_key(|(id, distance)| (*distance, *id))
            .map(|(id, _)| id)
    }

    fn can_move(&self) -> bool {
        self.engine
            .world()
            .battle(self.room)
            .and_then(|record| record.state(self.entity))
            .is_some_and(|state| state.ap > 0 || state.moves_left > 0)
    }

    fn ap(&self) -> u8 {
        self.engine
            .world()
            .battle(self.room)
            .map(|record| record.ap(self.entity))
            .unwrap_or(0)
    }
}

type Node<'e, 'a> = Box<dyn Behavior<PlanContext<'e, 'a>> + 'e>;

fn planner<'e, 'a>() -> Selector<'e, PlanContext<'e, 'a>> {
    let heal: Node<'e, 'a> = Box::new(Sequence::new(vec![
        Box::new(IsHurt),
        Box::new(Selector::new(vec![Box::new(HealAbility), Box::new(HealItem)])),
    ]));
    Selector::new(vec![
        Box::new(Flee),
        heal,
        Box::new(OffensiveAbility),
        Box::new(WeaponAttack),
        Box::new(Pass),
    ])
}

// ============================================================================
// Nodes
// ============================================================================

struct Flee;

impl Behavior<PlanContext<'_, '_>> for Flee {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        let Some(source) = ctx
            .engine
            .world()
            .entity(ctx.entity)
            .and_then(|record| record.effects.get(&EffectKey::AFRAID))
            .and_then(|fear| fear.source)
        else {
            return Status::Failure;
        };
        if ctx.has(&EffectKey::STUCK) || !ctx.can_move() {
            return Status::Failure;
        }
        let Some(grid) = ctx.engine.world().battle(ctx.room).map(|record| &record.grid) else {
            return Status::Failure;
        };
        let direction = grid
            .coordinates(source)
            .and_then(|danger| grid.move_toward(ctx.entity, danger, true));
        match direction {
            Some(direction) => ctx.decide(Decision::Step(direction)),
            None => Status::Failure,
        }
    }
}

struct IsHurt;

impl Behavior<PlanContext<'_, '_>> for IsHurt {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        let Some(profile) = ctx.engine.world().entity(ctx.entity).and_then(|e| e.ai) else {
            return Status::Failure;
        };
        let Some(max) = ctx.engine.stats(ctx.entity).map(|stats| stats.max_hp) else {
            return Status::Failure;
        };
        let current = ctx
            .engine
            .world()
            .entity(ctx.entity)
            .map(|record| record.hp.current)
            .unwrap_or(0);
        Status::when(u64::from(current) * 100 < u64::from(max) * u64::from(profile.heal_below_pct))
    }
}

struct HealAbility;

impl Behavior<PlanContext<'_, '_>> for HealAbility {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        let known = ctx
            .engine
            .world()
            .entity(ctx.entity)
            .map(|record| record.abilities.clone())
            .unwrap_or_default();
        let env = ctx.engine.env();
        let found = known.into_iter().find(|key| {
            env.ability(key)
                .is_some_and(|descriptor| descriptor.is_heal() && descriptor.targets_self())
                && ctx
                    .engine
                    .check_ability(ctx.entity, key, AbilityTarget::Entity(ctx.entity))
                    .is_ok()
        });
        match found {
            Some(ability) => ctx.decide(Decision::Cast {
                ability,
                target: AbilityTarget::Entity(ctx.entity),
            }),
            None => Status::Failure,
        }
    }
}

struct HealItem;

impl Behavior<PlanContext<'_, '_>> for HealItem {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        let Some(record) = ctx.engine.world().entity(ctx.entity) else {
            return Status::Failure;
        };
        if !record.ai.is_some_and(|profile| profile.uses_items)
            || ctx.ap() < ctx.engine.env().config.item_ap
        {
            return Status::Failure;
        }
        let found = record.inventory.iter().copied().find(|id| {
            ctx.engine
                .world()
                .item(*id)
                .and_then(|item| item.use_fn.as_ref())
                .is_some_and(|use_fn| use_fn.heals())
        });
        match found {
            Some(item) => {
                let target = ctx.entity;
                ctx.decide(Decision::UseItem { item, target })
            }
            None => Status::Failure,
        }
    }
}

struct OffensiveAbility;

impl Behavior<PlanContext<'_, '_>> for OffensiveAbility {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        let known = ctx
            .engine
            .world()
            .entity(ctx.entity)
            .map(|record| record.abilities.clone())
            .unwrap_or_default();
        let env = ctx.engine.env();

        let mut castable: Vec<(AbilityKey, AbilityTarget)> = Vec::new();
        for key in known {
            let Some(descriptor) = env.ability(&key).filter(|d| d.offensive) else {
                continue;
            };
            let target = match descriptor.targeting {
                Targeting::SelfOnly | Targeting::None => Some(AbilityTarget::None),
                Targeting::Entity => ctx.select_target(descriptor.range).map(AbilityTarget::Entity),
                Targeting::Tile => ctx
                    .select_target(descriptor.range)
                    .and_then(|id| ctx.engine.position_of(id))
                    .map(AbilityTarget::Tile),
            };
            let Some(target) = target else {
                continue;
            };
            if ctx.engine.check_ability(ctx.entity, &key, target).is_ok() {
                castable.push((key, target));
            }
        }

        let Some(index) = ctx.engine.pick(castable.len()) else {
            return Status::Failure;
        };
        let (ability, target) = castable.swap_remove(index);
        ctx.decide(Decision::Cast { ability, target })
    }
}

struct WeaponAttack;

impl Behavior<PlanContext<'_, '_>> for WeaponAttack {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        if ctx.has(&EffectKey::CEASEFIRE) || ctx.engine.on_swarm_tile(ctx.entity) {
            return Status::Failure;
        }
        let weapon = ctx.engine.weapon_of(ctx.entity);
        let Some(target) = ctx.select_target(weapon.range) else {
            return Status::Failure;
        };
        let Some(grid) = ctx.engine.world().battle(ctx.room).map(|record| &record.grid) else {
            return Status::Failure;
        };
        let distance = grid.distance(ctx.entity, target).unwrap_or(u32::MAX);
        if distance <= weapon.range {
            return if ctx.ap() >= weapon.ap_to_attack {
                ctx.decide(Decision::Attack(target))
            } else {
                Status::Failure
            };
        }

        if ctx.has(&EffectKey::STUCK) || !ctx.can_move() {
            return Status::Failure;
        }
        let direction = grid
            .coordinates(target)
            .and_then(|goal| grid.move_toward(ctx.entity, goal, false));
        match direction {
            Some(direction) => ctx.decide(Decision::Step(direction)),
            None => Status::Failure,
        }
    }
}

struct Pass;

impl Behavior<PlanContext<'_, '_>> for Pass {
    fn tick(&self, ctx: &mut PlanContext) -> Status {
        ctx.decide(Decision::Pass)
    }
}

// ============================================================================
// Engine integration
// ============================================================================

impl<'a> CombatEngine<'a> {
    /// Chooses the next action of AI combatant `entity` without acting.
    pub fn plan(&mut self, entity: EntityId) -> Decision {
        let Some(room) = self.world().battle_room_of(entity) else {
            return Decision::Pass;
        };
        let mut ctx = PlanContext {
            engine: self,
            entity,
            room,
            decision: None,
        };
        planner().tick(&mut ctx);
        ctx.decision.unwrap_or(Decision::Pass)
    }

    /// Carries out a decision for `entity`.
    pub fn execute(&mut self, entity: EntityId, decision: Decision) -> Result<(), CombatError> {
        match decision {
            Decision::Step(direction) => self.step(entity, direction).map(drop),
            Decision::Cast { ability, target } => self.cast(entity, &ability, target).map(drop),
            Decision::UseItem { item, target } => self.use_item(entity, item, Some(target)),
            Decision::Attack(target) => self.attack(entity, target).map(drop),
            Decision::Pass => self.pass_turn(entity),
        }
    }

    /// One AI decision, fired from the timer wheel.
    ///
    /// A failed action forfeits the rest of the turn. While the turn lasts
    /// the next decision is scheduled: sooner after a step than after
    /// anything else.
    pub(crate) fn ai_act(&mut self, room: RoomId, entity: EntityId) {
        let Some(record) = self.world_mut().battle_mut(room) else {
            return;
        };
        if record.current() != Some(entity) {
            return;
        }
        record.ai_decisions += 1;
        let decision = if record.ai_decisions > CombatConfig::MAX_AI_DECISIONS_PER_TURN {
            Decision::Pass
        } else {
            self.plan(entity)
        };
        debug!(%entity, ?decision, "AI decided");

        let stepped = matches!(decision, Decision::Step(_));
        if let Err(error) = self.execute(entity, decision) {
            debug!(%entity, %error, "AI action failed; passing");
            if self.is_turn(entity)
                && let Err(error) = self.pass_turn(entity)
            {
                warn!(%entity, %error, "AI could not pass");
            }
            return;
        }

        if self.is_turn(entity) {
            let config = self.config();
            let delay = if stepped {
                config.ai_step_delay
            } else {
                config.ai_action_delay
            };
            self.schedule_ai(room, entity, delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityDescriptor;
    use crate::effect::{EffectKind, EffectOrigin, EffectTemplate};
    use crate::state::ItemUse;
    use crate::testing::Fixture;

    /// Battle with Ann's turn already passed, so the rat is up.
    fn rat_to_act(fixture: &mut Fixture, distance: u32) -> (EntityId, EntityId) {
        let ann = fixture.character("Ann");
        let rat = fixture.creature("Rat");
        let mut engine = fixture.engine();
        engine.start_or_join_fight(ann, rat, distance).unwrap();
        engine.pass_turn(ann).unwrap();
        assert!(engine.is_turn(rat));
        (ann, rat)
    }

    fn distance(engine: &CombatEngine<'_>, a: EntityId, b: EntityId) -> u32 {
        let room = engine.world().battle_room_of(a).unwrap();
        engine.world().battle(room).unwrap().grid.distance(a, b).unwrap()
    }

    #[test]
    fn frightened_combatant_steps_away_from_the_source() {
        let mut fixture = Fixture::flat();
        let (ann, rat) = rat_to_act(&mut fixture, 1);
        let mut engine = fixture.engine();
        let fear = EffectTemplate::new(EffectKey::AFRAID, EffectKind::flag(), Some(9));
        engine.apply_effect(rat, &fear, Some(ann), EffectOrigin::Ability);
        let before = distance(&engine, ann, rat);

        let decision = engine.plan(rat);

        let Decision::Step(direction) = decision else {
            panic!("expected a step, got {decision:?}");
        };
        engine.step(rat, direction).unwrap();
        assert!(distance(&engine, ann, rat) > before);
    }

    #[test]
    fn adjacent_opponent_is_attacked() {
        let mut fixture = Fixture::flat();
        let (ann, rat) = rat_to_act(&mut fixture, 1);
        let mut engine = fixture.engine();

        assert_eq!(engine.plan(rat), Decision::Attack(ann));
    }

    #[test]
    fn distant_opponent_is_approached() {
        let mut fixture = Fixture::flat();
        let (ann, rat) = rat_to_act(&mut fixture, 4);
        let mut engine = fixture.engine();

        let decision = engine.plan(rat);
        let Decision::Step(direction) = decision else {
            panic!("expected a step, got {decision:?}");
        };
        engine.step(rat, direction).unwrap();
        assert_eq!(distance(&engine, ann, rat), 3);
    }

    #[test]
    fn hurt_combatant_drinks_a_healing_item() {
        let mut fixture = Fixture::flat();
        let (_, rat) = rat_to_act(&mut fixture, 1);
        let mut template = Fixture::template("Healing Draught");
        template.use_fn = Some(ItemUse::Heal { min: 10, max: 10 });
        let draught = fixture.give(rat, &template);
        fixture.world.entity_mut(rat).unwrap().hp.current = 5;
        let mut engine = fixture.engine();

        let decision = engine.plan(rat);
        assert_eq!(
            decision,
            Decision::UseItem {
                item: draught,
                target: rat
            }
        );

        engine.execute(rat, decision).unwrap();
        assert_eq!(engine.world().entity(rat).unwrap().hp.current, 15);
        assert!(engine.world().item(draught).is_none());
    }

    #[test]
    fn ceasefire_leaves_only_passing() {
        let mut fixture = Fixture::flat();
        let (_, rat) = rat_to_act(&mut fixture, 1);
        let mut engine = fixture.engine();
        let truce = EffectTemplate::new(EffectKey::CEASEFIRE, EffectKind::flag(), Some(10));
        engine.apply_effect(rat, &truce, None, EffectOrigin::Ability);

        assert_eq!(engine.plan(rat), Decision::Pass);
    }

    #[test]
    fn swarm_leaves_only_passing() {
        let mut fixture = Fixture::flat();
        let (_, rat) = rat_to_act(&mut fixture, 1);
        fixture.learn(
            rat,
            AbilityDescriptor {
                offensive: true,
                range: 3,
                ..AbilityDescriptor::new("spit", "Spit")
            },
        );
        let mut engine = fixture.engine();
        Fixture::swarm_under(&mut engine, rat);

        assert_eq!(engine.plan(rat), Decision::Pass);
    }

    #[test]
    fn scheduled_decision_fires_from_the_clock() {
        let mut fixture = Fixture::flat();
        let (ann, _) = rat_to_act(&mut fixture, 1);
        let mut engine = fixture.engine();

        engine.advance(CombatConfig::AI_ACTION_DELAY);

        assert!(engine.world().outbox.transcript().contains("Rat hits Ann!"));
        assert!(engine.is_turn(ann));
    }
}
