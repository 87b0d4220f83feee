//! Runtime orchestration for the combat simulation.
//!
//! This crate wraps a [`combat_core::World`] in a tokio task and exposes it
//! through a cloneable [`RuntimeHandle`]. Consumers build a [`Runtime`],
//! issue combat verbs through the handle, subscribe to engine events by
//! topic and persist worlds through a [`SnapshotRepository`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`workers`] keeps background tasks internal to the crate
//! - [`repository`] persists world snapshots
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, Topic};
pub use repository::{
    FileSnapshotRepository, InMemorySnapshotRepository, RepositoryError, SnapshotInfo,
    SnapshotRepository,
};
pub use runtime::{ClockMode, Runtime, RuntimeBuilder, RuntimeConfig};
