//! Deterministic turn-based grid combat for a text world.
//!
//! `combat-core` owns the rules: turn order and action points, the battle
//! grid and its tile effects, the stat pipeline, timed effects, abilities,
//! weapon combat, the AI planner and the out-of-combat tick. It performs no
//! I/O. Hosts drive it through [`CombatEngine`] and read back what happened
//! from the world's [`Outbox`].
//!
//! # Architecture
//!
//! ```text
//! host verbs ──▶ CombatEngine ──▶ World (entities, items, rooms, battles)
//!                    │   ▲
//!     CombatEnv ─────┘   └── TimerWheel (turn timer, AI steps, respawns)
//! (catalog, tables, config)
//! ```
//!
//! Every cross-reference is an id re-resolved through the world's registries
//! on use, so a world is plain data and serializes as a whole with the
//! `serde` feature.
pub mod ability;
pub mod ai;
pub mod combat;
pub mod config;
pub mod effect;
pub mod engine;
pub mod env;
pub mod error;
pub mod events;
pub mod grid;
pub mod schedule;
pub mod state;
pub mod stats;
pub mod turn;

#[cfg(test)]
mod testing;

pub use ability::{
    AbilityCatalog, AbilityDescriptor, AbilityKey, AbilityRole, AbilityTarget, AreaSpec,
    CastOutcome, CastPlan, ComponentRequirement, ResourceCost, Targeting,
};
pub use ai::{Decision, Status};
pub use combat::{AttackOutcome, DamagePart, Mitigation, Strike};
pub use config::CombatConfig;
pub use effect::{
    EffectInstance, EffectKey, EffectKind, EffectOrigin, EffectSet, EffectTemplate, FlagData,
    Insertion, PulseReport, StatTarget,
};
pub use engine::CombatEngine;
pub use env::{AbilityOracle, CombatEnv, PcgRng, RngOracle};
pub use error::{
    BlockReason, CombatError, ErrorSeverity, GameError, Remaining, TargetIssue,
};
pub use events::{CombatEvent, EndReason, Outbox};
pub use grid::{Direction, Grid, GridError, TileApply, TileEffect, TileTemplate, tiles_for};
pub use schedule::{Timer, TimerKind, TimerWheel};
pub use state::{
    AiProfile, Attribute, Attributes, CarryLimits, ComponentKind, DamageRange, DamageType,
    DeathPolicy, Entity, EntityId, EntityKind, EquipSlot, Equipment, Gear, Item, ItemId, ItemLocation,
    ItemTemplate, ItemUse, Pool, Position, ResourceKind, Room, RoomId, Tick, TypedTable,
    WeaponProfile, World,
};
pub use stats::{DerivedStats, StatTables};
pub use turn::{BattlePhase, CombatantState, FightEntry, TurnRecord};
