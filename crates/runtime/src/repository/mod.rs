//! Snapshot persistence for combat worlds.
//!
//! Worlds are encoded with bincode and sealed with a SHA-256 checksum of the
//! encoded bytes. The file repository stores one `<name>.snapshot` file per
//! snapshot and can export any of them as JSON for inspection; the in-memory
//! repository backs tests and ephemeral sessions.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::InMemorySnapshotRepository;
pub use traits::SnapshotRepository;

use chrono::{DateTime, Utc};
use combat_core::{Tick, World};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format version written into every snapshot header.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Metadata stored alongside an encoded world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub version: u32,
    pub clock: Tick,
    pub saved_at: DateTime<Utc>,
    /// Hex SHA-256 of the encoded world.
    pub checksum: String,
    pub entities: usize,
    pub battles: usize,
}

/// Header plus encoded world, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SealedSnapshot {
    pub info: SnapshotInfo,
    pub world: Vec<u8>,
}

impl SealedSnapshot {
    pub fn seal(name: &str, world: &World) -> Result<Self> {
        validate_name(name)?;
        let bytes =
            bincode::serialize(world).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let info = SnapshotInfo {
            name: name.to_string(),
            version: SNAPSHOT_VERSION,
            clock: world.clock,
            saved_at: Utc::now(),
            checksum: checksum(&bytes),
            entities: world.entities.len(),
            battles: world.battles.len(),
        };
        Ok(Self { info, world: bytes })
    }

    /// Verifies the checksum and decodes the world.
    pub fn open(&self) -> Result<World> {
        let actual = checksum(&self.world);
        if actual != self.info.checksum {
            return Err(RepositoryError::ChecksumMismatch {
                name: self.info.name.clone(),
                expected: self.info.checksum.clone(),
                actual,
            });
        }
        bincode::deserialize(&self.world).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Pretty JSON rendering of a world, for inspection and diffs.
pub fn world_to_json(world: &World) -> Result<String> {
    serde_json::to_string_pretty(world).map_err(|e| RepositoryError::Json(e.to_string()))
}

/// Names become file names, so they are restricted to a safe alphabet.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tampered_snapshot_fails_checksum() {
        let mut world = World::new(5);
        world.add_room("vault");
        let mut sealed = SealedSnapshot::seal("vault", &world).unwrap();
        assert_eq!(sealed.open().unwrap(), world);

        if let Some(byte) = sealed.world.last_mut() {
            *byte ^= 0xff;
        }
        assert!(matches!(
            sealed.open(),
            Err(RepositoryError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn names_cannot_escape_the_directory() {
        let world = World::new(1);
        for bad in ["", "../up", "a/b", ".hidden"] {
            assert!(matches!(
                SealedSnapshot::seal(bad, &world),
                Err(RepositoryError::InvalidName(_))
            ));
        }
        assert!(SealedSnapshot::seal("round-2_mid.v1", &world).is_ok());
    }
}
