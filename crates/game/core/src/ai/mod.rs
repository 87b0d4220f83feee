//! AI decision making for creature combatants.
//!
//! # Architecture
//!
//! - [`behavior`]: a tiny behavior-tree runtime (`Selector`, `Sequence`)
//! - `planner`: the priority tree and the engine hooks that run it from
//!   the timer wheel

pub mod behavior;
mod planner;

pub use behavior::{Behavior, Selector, Sequence, Status};
pub use planner::{Decision, PlanContext};
