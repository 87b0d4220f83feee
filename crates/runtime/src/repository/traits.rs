//! Repository contract for persisting worlds.

use combat_core::World;

use crate::repository::{Result, SnapshotInfo};

/// Named snapshots of a whole [`World`].
///
/// A snapshot captures everything the engine needs to carry on: entities,
/// items, rooms, battles with their grids, timers, the clock and the RNG
/// stream. Loading verifies the stored checksum before handing the world
/// back.
pub trait SnapshotRepository: Send + Sync {
    /// Save `world` under `name`, replacing any previous snapshot.
    fn save(&self, name: &str, world: &World) -> Result<SnapshotInfo>;

    /// Load the world saved under `name`.
    fn load(&self, name: &str) -> Result<Option<World>>;

    /// Header of the snapshot saved under `name`, without decoding the world.
    fn info(&self, name: &str) -> Result<Option<SnapshotInfo>>;

    fn exists(&self, name: &str) -> bool {
        matches!(self.info(name), Ok(Some(_)))
    }

    fn delete(&self, name: &str) -> Result<()>;

    /// Names of all stored snapshots, sorted.
    fn list(&self) -> Result<Vec<String>>;
}
