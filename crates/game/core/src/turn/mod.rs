//! Turn handling for battles.
//!
//! A battle is a [`TurnRecord`] keyed by room in [`crate::state::World`]. The
//! record owns the initiative order, the cursor, the per-turn timer, the
//! grid and each combatant's action points. The engine drives it:
//!
//! ```text
//! Assembling ──start──▶ AwaitingAction ◀──────────────┐
//!                          │ act                      │
//!                          ▼                          │
//!                    ResolvingAction ──AP left────────┤
//!                          │ AP spent / timeout       │
//!                          ▼                          │
//!                     Transitioning ──begin_turn──────┘
//!                          │ one side down / all disengaged
//!                          ▼
//!                       Stopped
//! ```

mod handler;
mod movement;
mod record;
mod tiles;

pub use record::{BattlePhase, CombatantState, TurnRecord};

/// How an entity entered a fight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FightEntry {
    /// A new battle started with the entity first in the order.
    Started,
    /// The entity was added to a battle already under way.
    Joined,
    /// The entity was already fighting.
    AlreadyFighting,
}

/// Result of trying to begin the current combatant's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TurnStart {
    /// The combatant may act.
    Ready,
    /// The turn was lost (no action points, or the combatant fell).
    Skipped,
    /// The battle no longer exists.
    Ended,
}
