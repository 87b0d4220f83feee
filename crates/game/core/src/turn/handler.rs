//! Battle lifecycle and turn sequencing.

use tracing::{debug, info, warn};

use super::{BattlePhase, FightEntry, TurnRecord, TurnStart};
use crate::effect::EffectKey;
use crate::engine::CombatEngine;
use crate::error::{CombatError, TargetIssue};
use crate::events::{CombatEvent, EndReason};
use crate::grid::Grid;
use crate::schedule::TimerKind;
use crate::state::{EntityId, Position, RoomId};

impl<'a> CombatEngine<'a> {
    // ========================================================================
    // Entry points
    // ========================================================================

    /// Starts a fight between `attacker` and `target`, or adds whichever of
    /// them is missing to the fight already running in their room.
    pub fn start_or_join_fight(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        engage_distance: u32,
    ) -> Result<FightEntry, CombatError> {
        let room = self
            .room_of(attacker)
            .ok_or(CombatError::UnknownEntity(attacker))?;
        if self.room_of(target) != Some(room) {
            return Err(CombatError::InvalidTarget(TargetIssue::NotHere));
        }
        if self.world().battle(room).is_none() {
            self.start_battle(room, attacker, target, engage_distance)?;
            return Ok(FightEntry::Started);
        }

        let attacker_joined = self.join_battle(room, attacker)?;
        self.join_battle(room, target)?;
        Ok(if attacker_joined {
            FightEntry::Joined
        } else {
            FightEntry::AlreadyFighting
        })
    }

    /// Opens a battle in `room`.
    ///
    /// Every standing entity in the room joins. The initiator stands at the
    /// grid origin and the first target `engage_distance` cells east of it;
    /// everyone else takes the nearest free cell on their side. Initiative is
    /// `1d20 + Dexterity`, ties keep room order, and the initiator always
    /// acts first.
    pub fn start_battle(
        &mut self,
        room: RoomId,
        initiator: EntityId,
        first_target: EntityId,
        engage_distance: u32,
    ) -> Result<(), CombatError> {
        if self.world().battle(room).is_some() {
            return self.join_battle(room, initiator).map(|_| ());
        }
        for entity in [initiator, first_target] {
            if !self.is_standing(entity) {
                return Err(CombatError::InvalidTarget(TargetIssue::Defeated));
            }
        }

        let config = self.config();
        let (width, height) = config.grid_dimensions();
        let mut record = TurnRecord::new(room, Grid::new(width, height));

        let distance = engage_distance.clamp(1, config.max_engage_distance.max(1));
        let far = Position::new(distance.min(width.saturating_sub(1)) as i32, 0);
        record.grid.place(initiator, Position::ORIGIN)?;
        let far = if record.grid.is_free(far) {
            far
        } else {
            record
                .grid
                .free_cell_near(far)
                .ok_or(CombatError::Movement(crate::grid::GridError::OutOfBounds(far)))?
        };
        record.grid.place(first_target, far)?;

        let initiator_side = self.hostility(initiator);
        let mut gathered = vec![initiator, first_target];
        let occupants = self
            .world()
            .rooms
            .get(room)
            .map(|room| room.occupants.clone())
            .unwrap_or_default();
        for entity in occupants {
            if gathered.contains(&entity) || !self.is_standing(entity) {
                continue;
            }
            let anchor = if self.hostility(entity) == initiator_side {
                Position::ORIGIN
            } else {
                far
            };
            match record.grid.free_cell_near(anchor) {
                Some(cell) => {
                    record.grid.place(entity, cell)?;
                    gathered.push(entity);
                }
                None => warn!(%entity, %room, "no free cell for combatant; left out"),
            }
        }

        let mut rolled: Vec<(EntityId, i32)> = Vec::with_capacity(gathered.len());
        for entity in gathered {
            let dexterity = self
                .stats(entity)
                .map(|stats| stats.attributes.dexterity)
                .unwrap_or(0);
            rolled.push((entity, self.roll(1, 20) as i32 + dexterity));
        }
        rolled.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(index) = rolled.iter().position(|(id, _)| *id == initiator) {
            let first = rolled.remove(index);
            rolled.insert(0, first);
        }

        for (entity, _) in &rolled {
            record.push(*entity);
        }
        let names: Vec<String> = record.order.iter().map(|id| self.name(*id)).collect();
        self.say(room, format!("Turn order: {}", names.join(", ")));
        self.emit(CombatEvent::BattleStarted {
            room,
            order: record.order.clone(),
        });
        info!(%room, combatants = record.order.len(), "battle started");

        let interval = config.turn_interval;
        let at = self.world().clock + u64::from(interval);
        record.interval_token = Some(
            self.world_mut()
                .timers
                .schedule(at, TimerKind::TurnInterval { room }),
        );
        record.round = 1;
        record.cursor = 0;
        record.timer = config.turn_timeout;
        record.phase = BattlePhase::AwaitingAction;
        self.world_mut().battles.insert(room, record);

        if self.begin_turn(room) == TurnStart::Skipped {
            self.next_turn(room);
        }
        Ok(())
    }

    /// Adds `entity` to the running battle in `room`, just before the cursor,
    /// so the combatant acting now keeps its turn.
    ///
    /// Returns false when the entity was already fighting.
    pub fn join_battle(&mut self, room: RoomId, entity: EntityId) -> Result<bool, CombatError> {
        if !self.is_standing(entity) {
            return Err(CombatError::InvalidTarget(TargetIssue::Defeated));
        }
        if self.room_of(entity) != Some(room) {
            return Err(CombatError::InvalidTarget(TargetIssue::NotHere));
        }
        let side = self.hostility(entity);
        let allies: Vec<EntityId> = {
            let Some(record) = self.world().battle(room) else {
                return Err(CombatError::NotInCombat);
            };
            if record.contains(entity) {
                return Ok(false);
            }
            record.order.clone()
        };
        let anchor = allies
            .into_iter()
            .filter(|id| self.hostility(*id) == side)
            .find_map(|id| self.world().battle(room)?.grid.coordinates(id))
            .unwrap_or(Position::ORIGIN);

        let name = self.name(entity);
        let Some(record) = self.world_mut().battle_mut(room) else {
            return Err(CombatError::NotInCombat);
        };
        let cell = record
            .grid
            .free_cell_near(anchor)
            .ok_or(crate::grid::GridError::OutOfBounds(anchor))?;
        record.grid.place(entity, cell)?;
        record.insert_before_cursor(entity);
        self.say(room, format!("{name} joins the fight!"));
        debug!(%entity, %room, "joined battle");
        Ok(true)
    }

    // ========================================================================
    // Turn sequencing
    // ========================================================================

    /// Prepares the turn of the combatant under the cursor.
    ///
    /// Order: regeneration, action points, cooldowns, effects, tiles under
    /// the combatant, grid rendering, then the AI if there is one.
    pub(crate) fn begin_turn(&mut self, room: RoomId) -> TurnStart {
        let config = self.config();
        let Some(record) = self.world_mut().battle_mut(room) else {
            return TurnStart::Ended;
        };
        let Some(entity) = record.current() else {
            return TurnStart::Skipped;
        };
        record.phase = BattlePhase::AwaitingAction;
        record.timer = config.turn_timeout;
        record.warned = false;
        record.ai_decisions = 0;
        let round = record.round;

        if !self.is_standing(entity) {
            warn!(%entity, %room, "cursor on a fallen combatant; skipping");
            return TurnStart::Skipped;
        }

        let secs = config.secs_per_turn;
        self.regenerate(entity, secs);

        let name = self.name(entity);
        let frozen = self.has_effect(entity, &EffectKey::FROZEN);
        let knocked_down = self.has_effect(entity, &EffectKey::KNOCKED_DOWN);
        let ap = if frozen {
            self.say(room, format!("{name} is frozen solid and cannot act."));
            0
        } else if knocked_down {
            self.remove_effect(entity, &EffectKey::KNOCKED_DOWN);
            self.say(room, format!("{name} stands up."));
            0
        } else {
            self.world()
                .entity(entity)
                .map_or(config.default_ap, |record| record.action_points(config.default_ap))
        };
        if let Some(state) = self
            .world_mut()
            .battle_mut(room)
            .and_then(|record| record.state_mut(entity))
        {
            state.ap = ap;
            state.moves_left = 0;
            state.standing_up = knocked_down && !frozen;
        }

        if let Some(record) = self.world_mut().entity_mut(entity) {
            record.tick_cooldowns(secs);
        }

        if self.pulse_effects(entity, secs, secs).defeated || self.apply_tiles_under(entity) {
            return self.vacated(room);
        }

        self.render_for_observers(room);
        self.emit(CombatEvent::TurnStarted {
            room,
            entity,
            round,
        });
        debug!(%entity, %room, round, ap, "turn begins");

        if ap == 0 {
            return TurnStart::Skipped;
        }
        self.tell(entity, "It is your turn.");
        if self.world().entity(entity).is_some_and(|record| record.is_ai()) {
            self.schedule_ai(room, entity, config.ai_action_delay);
        }
        TurnStart::Ready
    }

    fn vacated(&self, room: RoomId) -> TurnStart {
        if self.world().battle(room).is_some() {
            TurnStart::Skipped
        } else {
            TurnStart::Ended
        }
    }

    /// Moves the cursor to the next standing combatant and begins its turn.
    ///
    /// Combatants that lose their turn are passed over in the same call; the
    /// loop is bounded so a battle full of frozen combatants cannot spin.
    pub fn next_turn(&mut self, room: RoomId) {
        let secs = self.config().secs_per_turn;
        let budget = self
            .world()
            .battle(room)
            .map(|record| record.order.len() * 2 + 1)
            .unwrap_or(0);

        for _ in 0..budget {
            let Some(record) = self.world_mut().battle_mut(room) else {
                return;
            };
            let pending = record.ai_token.take();
            record.phase = BattlePhase::Transitioning;
            record.timer = 0;
            record.warned = false;
            let round = record.round;
            record.advance_cursor();
            if record.order.is_empty() {
                return;
            }
            let wrapped = record.round != round;
            let faded = if wrapped {
                record.grid.age_tiles(secs)
            } else {
                Vec::new()
            };
            if let Some(token) = pending {
                self.world_mut().timers.cancel(token);
            }
            for tile in faded {
                self.say(room, format!("The {} fades away.", tile.name));
            }

            match self.begin_turn(room) {
                TurnStart::Ready | TurnStart::Ended => return,
                TurnStart::Skipped => {}
            }
        }
        if budget > 0 {
            warn!(%room, "no combatant could take a turn this pass");
        }
    }

    /// Debits `cost` action points from `entity` and ends its turn when none
    /// are left.
    pub fn spend_action(&mut self, entity: EntityId, cost: u8) {
        if let Some(room) = self.world().battle_room_of(entity) {
            self.finish_action(room, entity, cost);
        }
    }

    /// Closes an action taken in `room`: the actor pays, and the turn passes
    /// when the actor is spent or no longer holds it.
    pub(crate) fn finish_action(&mut self, room: RoomId, entity: EntityId, cost: u8) {
        let Some(record) = self.world_mut().battle_mut(room) else {
            return;
        };
        if record.current_removed {
            self.next_turn(room);
            return;
        }
        if record.current() != Some(entity) {
            return;
        }
        let spent = match record.state_mut(entity) {
            Some(state) => {
                state.ap = state.ap.saturating_sub(cost);
                state.ap == 0 && state.moves_left == 0
            }
            None => true,
        };
        record.phase = BattlePhase::AwaitingAction;
        if spent {
            self.next_turn(room);
        }
    }

    /// Advances the battle when its current combatant left mid-turn.
    pub(crate) fn settle(&mut self, room: RoomId) {
        if self
            .world()
            .battle(room)
            .is_some_and(|record| record.current_removed || record.current().is_none())
        {
            self.next_turn(room);
        }
    }

    /// Periodic turn timer. Warns the acting combatant once when time runs
    /// low and forfeits the turn at zero.
    pub fn tick_turn_timer(&mut self, room: RoomId) {
        let config = self.config();
        let Some(record) = self.world_mut().battle_mut(room) else {
            return;
        };
        let Some(current) = record.current() else {
            self.settle(room);
            return;
        };
        record.timer = record.timer.saturating_sub(config.turn_interval);
        let remaining = record.timer;

        if remaining == 0 {
            let name = self.name(current);
            self.tell(current, "You took too long; your turn has timed out.");
            self.say(room, format!("{name} hesitates and loses the turn."));
            self.next_turn(room);
        } else if remaining <= config.warn_threshold && !record.warned {
            record.warned = true;
            self.tell(current, format!("You have {remaining} seconds left to act."));
        }
    }

    // ========================================================================
    // Defeat and termination
    // ========================================================================

    /// Handles a combatant reaching zero health inside a battle.
    pub(crate) fn at_defeat(&mut self, room: RoomId, entity: EntityId, killer: Option<EntityId>) {
        if let Some(record) = self.world_mut().entity_mut(entity) {
            record.hp.current = 0;
        }
        let side = self.hostility(entity);
        let enemies: Vec<EntityId> = self
            .world()
            .battle(room)
            .map(|record| record.order.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|id| *id != entity && self.hostility(*id) != side)
            .collect();
        debug!(%entity, ?killer, %room, "combatant defeated");

        self.award_experience(entity, &enemies);
        self.defeat_hook(entity);

        if let Some(record) = self.world_mut().battle_mut(room) {
            record.remove(entity);
            record.grid.remove(entity);
        }
        self.all_defeat_check(room);
    }

    /// Ends the battle when one side has no standing combatants left.
    ///
    /// Safe to call after the battle is gone; it then does nothing.
    pub fn all_defeat_check(&mut self, room: RoomId) -> bool {
        let Some(record) = self.world().battle(room) else {
            return false;
        };
        let (mut hostile, mut friendly) = (0, 0);
        for id in &record.order {
            if !self.is_standing(*id) {
                continue;
            }
            if self.hostility(*id) {
                hostile += 1;
            } else {
                friendly += 1;
            }
        }
        if hostile == 0 || friendly == 0 {
            self.end_battle(room, EndReason::OneSideDown);
            return true;
        }
        false
    }

    /// Stops and destroys the battle in `room`.
    pub fn end_battle(&mut self, room: RoomId, reason: EndReason) {
        let Some(record) = self.world_mut().battles.remove(&room) else {
            return;
        };
        for token in [record.interval_token, record.ai_token].into_iter().flatten() {
            self.world_mut().timers.cancel(token);
        }

        let survivors: Vec<EntityId> = record
            .order
            .iter()
            .copied()
            .filter(|id| self.is_standing(*id))
            .collect();
        match reason {
            EndReason::OneSideDown if !survivors.is_empty() => {
                let names: Vec<String> = survivors.iter().map(|id| self.name(*id)).collect();
                self.say(
                    room,
                    format!("The fight is over. Victorious: {}.", names.join(", ")),
                );
                let at = self.world().clock + u64::from(self.config().victory_look_delay);
                self.world_mut().timers.schedule(
                    at,
                    TimerKind::VictoryLook {
                        survivors: survivors.clone(),
                    },
                );
            }
            EndReason::OneSideDown => self.say(room, "The fight is over."),
            EndReason::AllDisengaged => self.say(room, "The fight breaks up."),
        }
        self.emit(CombatEvent::BattleEnded {
            room,
            reason,
            survivors,
        });
        info!(%room, %reason, rounds = record.round, "battle ended");
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(crate) fn hostility(&self, entity: EntityId) -> bool {
        self.world()
            .entity(entity)
            .is_some_and(|record| record.hostile_to_players)
    }

    pub(crate) fn schedule_ai(&mut self, room: RoomId, entity: EntityId, delay: u32) {
        let at = self.world().clock + u64::from(delay.max(1));
        let token = self
            .world_mut()
            .timers
            .schedule(at, TimerKind::AiStep { room, entity });
        let previous = self
            .world_mut()
            .battle_mut(room)
            .and_then(|record| record.ai_token.replace(token));
        if let Some(previous) = previous {
            self.world_mut().timers.cancel(previous);
        }
    }

    fn render_for_observers(&mut self, room: RoomId) {
        let Some(record) = self.world().battle(room) else {
            return;
        };
        let observers: Vec<EntityId> = record
            .order
            .iter()
            .copied()
            .filter(|id| self.world().entity(*id).is_some_and(|e| !e.is_ai()))
            .collect();
        let renderings: Vec<(EntityId, String)> = observers
            .into_iter()
            .map(|observer| {
                let rendering = record.grid.render(observer, |id| {
                    self.world()
                        .entity(id)
                        .map(|entity| entity.initial())
                        .unwrap_or('?')
                });
                (observer, rendering)
            })
            .collect();
        for (observer, rendering) in renderings {
            self.emit(CombatEvent::Grid {
                room,
                observer,
                rendering,
            });
        }
    }
}
