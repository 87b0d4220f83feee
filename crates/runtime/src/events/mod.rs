//! Topic-based event bus for engine events.
//!
//! The simulation worker drains the world's outbox after every command and
//! publishes each [`combat_core::CombatEvent`] on the topic its audience
//! listens to.

mod bus;

pub use bus::{Event, EventBus, Topic};
