//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the simulation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use combat_content::{Content, ContentFactory};
use combat_core::World;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::repository::{FileSnapshotRepository, SnapshotRepository};
use crate::workers::{ClockWorker, Command, SimulationWorker};

/// How game time moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Only [`RuntimeHandle::advance`] moves the clock.
    Manual,
    /// One game second every `millis_per_second` real milliseconds.
    RealTime { millis_per_second: u64 },
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Seed for a freshly created world. Ignored when a world is supplied.
    pub seed: u64,
    pub clock: ClockMode,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Directory of the file snapshot repository. `None` disables snapshots
    /// unless a repository is supplied to the builder.
    pub snapshot_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Platform data directory for snapshots.
    ///
    /// - Linux: `~/.local/share/combat/snapshots`
    /// - macOS: `~/Library/Application Support/combat/snapshots`
    /// - Fallback: `./save_data/snapshots`
    pub fn default_snapshot_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "combat")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./save_data"))
            .join("snapshots")
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            clock: ClockMode::Manual,
            event_buffer_size: 256,
            command_buffer_size: 32,
            snapshot_dir: None,
        }
    }
}

/// Main runtime that orchestrates the combat simulation
///
/// Runtime owns the workers; [`RuntimeHandle`] provides a cloneable façade
/// for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
    clock_worker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The simulation worker stops once every handle clone is dropped.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(clock) = self.clock_worker_handle {
            clock.abort();
        }
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        info!("runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    world: Option<World>,
    content: Option<Content>,
    content_dir: Option<PathBuf>,
    repository: Option<Arc<dyn SnapshotRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
            content: None,
            content_dir: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from an existing world instead of an empty one.
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Use an already loaded rule set.
    pub fn content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Load the rule set from a data directory. Missing files fall back to
    /// the standard content.
    pub fn content_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.content_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Persist snapshots through `repository`.
    pub fn repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime and spawn its workers on the current tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let content = match (self.content, self.content_dir) {
            (Some(content), _) => Ok(content),
            (None, Some(dir)) => ContentFactory::new(dir).load(),
            (None, None) => ContentFactory::standard(),
        }
        .map_err(|e| RuntimeError::Content(e.to_string()))?;
        let content = Arc::new(content);

        let repository = match (self.repository, &self.config.snapshot_dir) {
            (Some(repository), _) => Some(repository),
            (None, Some(dir)) => {
                Some(Arc::new(FileSnapshotRepository::new(dir)?) as Arc<dyn SnapshotRepository>)
            }
            (None, None) => None,
        };

        let world = self
            .world
            .unwrap_or_else(|| World::new(self.config.seed));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx.clone(), event_bus.clone(), content.clone());

        let sim_worker = SimulationWorker::new(world, content, command_rx, event_bus, repository);
        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        let clock_worker_handle = match self.config.clock {
            ClockMode::Manual => None,
            ClockMode::RealTime { millis_per_second } => {
                let clock = ClockWorker::new(command_tx, millis_per_second);
                Some(tokio::spawn(async move {
                    clock.run().await;
                }))
            }
        };

        info!(clock = ?self.config.clock, "runtime started");

        Ok(Runtime {
            handle,
            sim_worker_handle,
            clock_worker_handle,
        })
    }
}
