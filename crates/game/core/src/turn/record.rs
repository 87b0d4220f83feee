use std::collections::BTreeMap;

use crate::events::EndReason;
use crate::grid::Grid;
use crate::state::{EntityId, RoomId, TimerToken};

/// Where a battle is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePhase {
    /// Combatants gathered, grid seeded, first turn not begun yet.
    Assembling,
    /// The current combatant may act.
    AwaitingAction,
    /// An action of the current combatant is being resolved.
    ResolvingAction,
    /// The cursor is moving to the next combatant.
    Transitioning,
    Stopped(EndReason),
}

/// Combat-only state of one participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantState {
    pub ap: u8,
    /// Cells that can still be walked with the action point already spent
    /// on movement.
    pub moves_left: u32,
    /// Set when the turn was spent getting up from a knockdown.
    pub standing_up: bool,
}

/// Turn bookkeeping for the battle in one room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnRecord {
    pub room: RoomId,
    /// Initiative order.
    pub order: Vec<EntityId>,
    pub cursor: usize,
    /// Zero until the first turn begins.
    pub round: u32,
    /// Seconds left in the current turn.
    pub timer: u32,
    pub warned: bool,
    /// Pending AI decision, if any.
    pub ai_token: Option<TimerToken>,
    /// Decisions the current AI combatant made this turn.
    pub ai_decisions: u32,
    pub interval_token: Option<TimerToken>,
    pub phase: BattlePhase,
    pub grid: Grid,
    pub combatants: BTreeMap<EntityId, CombatantState>,
    /// The current combatant left the order; the cursor already points at
    /// the one who follows.
    pub current_removed: bool,
}

impl TurnRecord {
    pub fn new(room: RoomId, grid: Grid) -> Self {
        Self {
            room,
            order: Vec::new(),
            cursor: 0,
            round: 0,
            timer: 0,
            warned: false,
            ai_token: None,
            ai_decisions: 0,
            interval_token: None,
            phase: BattlePhase::Assembling,
            grid,
            combatants: BTreeMap::new(),
            current_removed: false,
        }
    }

    pub fn current(&self) -> Option<EntityId> {
        if self.current_removed {
            return None;
        }
        self.order.get(self.cursor).copied()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.order.contains(&entity)
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, BattlePhase::Stopped(_) | BattlePhase::Assembling)
    }

    pub fn state(&self, entity: EntityId) -> Option<&CombatantState> {
        self.combatants.get(&entity)
    }

    pub fn state_mut(&mut self, entity: EntityId) -> Option<&mut CombatantState> {
        self.combatants.get_mut(&entity)
    }

    pub fn ap(&self, entity: EntityId) -> u8 {
        self.state(entity).map(|state| state.ap).unwrap_or(0)
    }

    /// Appends during assembly.
    pub fn push(&mut self, entity: EntityId) {
        if !self.contains(entity) {
            self.order.push(entity);
            self.combatants.insert(entity, CombatantState::default());
        }
    }

    /// Inserts a late joiner immediately before the cursor so it acts after
    /// everyone already waiting this round.
    pub fn insert_before_cursor(&mut self, entity: EntityId) {
        if self.contains(entity) {
            return;
        }
        let at = self.cursor.min(self.order.len());
        self.order.insert(at, entity);
        if !self.order.is_empty() && at < self.order.len() - 1 {
            self.cursor += 1;
        }
        self.combatants.insert(entity, CombatantState::default());
    }

    /// Removes a combatant and keeps the cursor on the same logical turn.
    /// Returns true when the removed entity held the current turn.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        self.combatants.remove(&entity);
        let Some(index) = self.order.iter().position(|id| *id == entity) else {
            return false;
        };
        self.order.remove(index);

        if index < self.cursor {
            self.cursor -= 1;
            false
        } else if index == self.cursor && !self.current_removed {
            self.current_removed = true;
            true
        } else {
            false
        }
    }

    /// Moves the cursor to the next slot, wrapping to a new round.
    pub fn advance_cursor(&mut self) {
        if self.order.is_empty() {
            self.cursor = 0;
            self.current_removed = false;
            return;
        }
        if self.current_removed {
            self.current_removed = false;
        } else {
            self.cursor += 1;
        }
        if self.cursor >= self.order.len() {
            self.cursor = 0;
            self.round += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ids: &[u32]) -> TurnRecord {
        let mut record = TurnRecord::new(RoomId(1), Grid::new(4, 4));
        for id in ids {
            record.push(EntityId(*id));
        }
        record.round = 1;
        record
    }

    #[test]
    fn join_lands_before_cursor() {
        let mut record = record(&[1, 2, 3]);
        record.cursor = 1;

        record.insert_before_cursor(EntityId(9));

        assert_eq!(
            record.order,
            vec![EntityId(1), EntityId(9), EntityId(2), EntityId(3)]
        );
        assert_eq!(record.current(), Some(EntityId(2)));
    }

    #[test]
    fn removing_current_keeps_following_turn() {
        let mut record = record(&[1, 2, 3]);
        record.cursor = 1;

        assert!(record.remove(EntityId(2)));
        assert_eq!(record.current(), None);

        record.advance_cursor();
        assert_eq!(record.current(), Some(EntityId(3)));
        assert_eq!(record.round, 1);
    }

    #[test]
    fn removing_earlier_combatant_shifts_cursor() {
        let mut record = record(&[1, 2, 3]);
        record.cursor = 2;

        assert!(!record.remove(EntityId(1)));
        assert_eq!(record.current(), Some(EntityId(3)));
    }

    #[test]
    fn advancing_past_end_starts_new_round() {
        let mut record = record(&[1, 2]);
        record.cursor = 1;
        record.advance_cursor();
        assert_eq!(record.cursor, 0);
        assert_eq!(record.round, 2);
    }

    #[test]
    fn removing_last_current_wraps_on_advance() {
        let mut record = record(&[1, 2, 3]);
        record.cursor = 2;
        record.remove(EntityId(3));
        record.advance_cursor();
        assert_eq!(record.current(), Some(EntityId(1)));
        assert_eq!(record.round, 2);
    }
}
