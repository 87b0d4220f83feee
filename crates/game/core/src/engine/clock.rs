//! Game clock and timer dispatch.

use tracing::{debug, trace};

use super::CombatEngine;
use crate::events::CombatEvent;
use crate::schedule::{Timer, TimerKind};
use crate::state::RoomId;

impl<'a> CombatEngine<'a> {
    /// Advances the clock by `secs`, one second at a time.
    ///
    /// Each second first fires the timers that came due, in scheduling
    /// order, and then runs the out-of-combat tick.
    pub fn advance(&mut self, secs: u32) {
        for _ in 0..secs {
            let now = self.world().clock + 1;
            self.world_mut().clock = now;
            let due = self.world_mut().timers.pop_due(now);
            trace!(%now, due = due.len(), "clock tick");
            for timer in due {
                self.fire(timer);
            }
            self.tick_out_of_combat();
        }
    }

    fn fire(&mut self, timer: Timer) {
        match timer.kind {
            TimerKind::TurnInterval { room } => self.on_turn_interval(room, timer),
            TimerKind::AiStep { room, entity } => {
                let Some(record) = self.world_mut().battle_mut(room) else {
                    return;
                };
                if record.ai_token != Some(timer.token) {
                    debug!(%room, %entity, "stale AI timer dropped");
                    return;
                }
                record.ai_token = None;
                if record.current() == Some(entity) {
                    self.ai_act(room, entity);
                }
            }
            TimerKind::VictoryLook { survivors } => {
                for entity in survivors {
                    if self.world().entity(entity).is_some_and(|e| e.location.is_some()) {
                        self.emit(CombatEvent::LookAround { entity });
                    }
                }
            }
            TimerKind::Respawn { entity } => self.respawn(entity),
        }
    }

    fn on_turn_interval(&mut self, room: RoomId, timer: Timer) {
        let Some(record) = self.world().battle(room) else {
            return;
        };
        if record.interval_token != Some(timer.token) {
            return;
        }
        self.tick_turn_timer(room);

        let interval = u64::from(self.config().turn_interval.max(1));
        let at = self.world().clock + interval;
        if self.world().battle(room).is_none() {
            return;
        }
        let token = self
            .world_mut()
            .timers
            .schedule(at, TimerKind::TurnInterval { room });
        if let Some(record) = self.world_mut().battle_mut(room) {
            record.interval_token = Some(token);
        }
    }
}
