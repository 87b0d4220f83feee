//! Timer wheel for deferred engine work.
//!
//! Turn intervals, AI decisions, victory look-arounds and respawns are all
//! one entry in the same wheel. Timers carry ids, not references, so a timer
//! whose subject vanished fires harmlessly and is dropped.

use std::collections::BTreeMap;

use crate::state::{EntityId, RoomId, Tick, TimerToken};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimerKind {
    /// Repeating per-battle timer that counts the active turn down.
    TurnInterval { room: RoomId },
    /// Next AI decision. Valid only while the battle still holds this token.
    AiStep { room: RoomId, entity: EntityId },
    VictoryLook { survivors: Vec<EntityId> },
    Respawn { entity: EntityId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timer {
    pub token: TimerToken,
    pub fire_at: Tick,
    pub kind: TimerKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerWheel {
    slots: BTreeMap<Tick, Vec<Timer>>,
    next_token: u32,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: Tick, kind: TimerKind) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.slots.entry(fire_at).or_default().push(Timer {
            token,
            fire_at,
            kind,
        });
        token
    }

    /// Removes a pending timer. Cancelling a fired or unknown token is a no-op.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let mut found = false;
        self.slots.retain(|_, timers| {
            let before = timers.len();
            timers.retain(|timer| timer.token != token);
            found |= timers.len() != before;
            !timers.is_empty()
        });
        found
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&TimerKind) -> bool) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, timers| {
            let before = timers.len();
            timers.retain(|timer| !predicate(&timer.kind));
            removed += before - timers.len();
            !timers.is_empty()
        });
        removed
    }

    /// Removes and returns every timer due at or before `now`, earliest
    /// first and in scheduling order within one tick.
    pub fn pop_due(&mut self, now: Tick) -> Vec<Timer> {
        let later = self.slots.split_off(&(now + 1));
        let due = std::mem::replace(&mut self.slots, later);
        due.into_values().flatten().collect()
    }

    pub fn contains(&self, predicate: impl Fn(&TimerKind) -> bool) -> bool {
        self.slots
            .values()
            .flatten()
            .any(|timer| predicate(&timer.kind))
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.slots
            .values()
            .flatten()
            .any(|timer| timer.token == token)
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_due_returns_timers_in_firing_order() {
        let mut wheel = TimerWheel::new();
        let late = wheel.schedule(Tick(5), TimerKind::Respawn { entity: EntityId(1) });
        let early = wheel.schedule(Tick(2), TimerKind::Respawn { entity: EntityId(2) });
        let future = wheel.schedule(Tick(9), TimerKind::Respawn { entity: EntityId(3) });

        let fired: Vec<TimerToken> = wheel.pop_due(Tick(5)).iter().map(|t| t.token).collect();

        assert_eq!(fired, vec![early, late]);
        assert!(wheel.is_pending(future));
        assert_eq!(wheel.len(), 1);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut wheel = TimerWheel::new();
        let token = wheel.schedule(
            Tick(1),
            TimerKind::AiStep {
                room: RoomId(1),
                entity: EntityId(4),
            },
        );
        assert!(wheel.cancel(token));
        assert!(!wheel.cancel(token));
        assert!(wheel.pop_due(Tick(10)).is_empty());
    }

    #[test]
    fn cancel_where_filters_by_kind() {
        let mut wheel = TimerWheel::new();
        wheel.schedule(Tick(1), TimerKind::TurnInterval { room: RoomId(1) });
        wheel.schedule(Tick(1), TimerKind::TurnInterval { room: RoomId(2) });

        let removed = wheel.cancel_where(
            |kind| matches!(kind, TimerKind::TurnInterval { room } if *room == RoomId(1)),
        );

        assert_eq!(removed, 1);
        assert!(wheel.contains(
            |kind| matches!(kind, TimerKind::TurnInterval { room } if *room == RoomId(2))
        ));
    }
}
