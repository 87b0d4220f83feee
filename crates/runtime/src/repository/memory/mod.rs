//! In-memory snapshot repository for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::RwLock;

use combat_core::World;

use crate::repository::{
    RepositoryError, Result, SealedSnapshot, SnapshotInfo, SnapshotRepository,
};

/// Keeps sealed snapshots in a map. Loads go through the same checksum
/// verification as the file repository.
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<BTreeMap<String, SealedSnapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn save(&self, name: &str, world: &World) -> Result<SnapshotInfo> {
        let sealed = SealedSnapshot::seal(name, world)?;
        let info = sealed.info.clone();
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(name.to_string(), sealed);
        Ok(info)
    }

    fn load(&self, name: &str) -> Result<Option<World>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.get(name).map(SealedSnapshot::open).transpose()
    }

    fn info(&self, name: &str) -> Result<Option<SnapshotInfo>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(name).map(|sealed| sealed.info.clone()))
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(name);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.keys().cloned().collect())
    }
}
