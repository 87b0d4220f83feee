//! File-based snapshot repository.

use std::fs;
use std::path::{Path, PathBuf};

use combat_core::World;

use crate::repository::{
    RepositoryError, Result, SealedSnapshot, SnapshotInfo, SnapshotRepository, world_to_json,
};

const EXTENSION: &str = "snapshot";

/// Stores each snapshot as `<name>.snapshot` under a base directory.
///
/// # File Format
///
/// A bincode-encoded [`SnapshotInfo`] header followed by the bincode-encoded
/// world. The header carries the SHA-256 checksum of the world bytes, so a
/// truncated or edited file is rejected on load. Writes go to a temporary
/// file first and are renamed into place.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Create a new file-based repository, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the snapshot file for `name`.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Writes the world saved under `name` as pretty JSON to `dest`.
    pub fn export_json(&self, name: &str, dest: impl AsRef<Path>) -> Result<bool> {
        let Some(world) = self.load(name)? else {
            return Ok(false);
        };
        let json = world_to_json(&world)?;
        fs::write(dest.as_ref(), json).map_err(RepositoryError::Io)?;
        tracing::debug!("Exported snapshot '{}' to {}", name, dest.as_ref().display());
        Ok(true)
    }

    /// Reads a snapshot file from an arbitrary path.
    pub fn read_path(path: &Path) -> Result<(SnapshotInfo, World)> {
        let sealed = read_sealed(path)?;
        let world = sealed.open()?;
        Ok((sealed.info, world))
    }

    fn read(&self, name: &str) -> Result<Option<SealedSnapshot>> {
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Ok(None);
        }
        read_sealed(&path).map(Some)
    }
}

fn read_sealed(path: &Path) -> Result<SealedSnapshot> {
    let bytes = fs::read(path).map_err(RepositoryError::Io)?;
    bincode::deserialize(&bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

impl SnapshotRepository for FileSnapshotRepository {
    fn save(&self, name: &str, world: &World) -> Result<SnapshotInfo> {
        let sealed = SealedSnapshot::seal(name, world)?;
        let path = self.snapshot_path(name);
        let temp_path = path.with_extension("snapshot.tmp");

        let bytes = bincode::serialize(&sealed)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved snapshot '{}' to {}", name, path.display());
        Ok(sealed.info)
    }

    fn load(&self, name: &str) -> Result<Option<World>> {
        let Some(sealed) = self.read(name)? else {
            return Ok(None);
        };
        let world = sealed.open()?;
        tracing::debug!("Loaded snapshot '{}' at {}", name, sealed.info.clock);
        Ok(Some(world))
    }

    fn info(&self, name: &str) -> Result<Option<SnapshotInfo>> {
        Ok(self.read(name)?.map(|sealed| sealed.info))
    }

    fn exists(&self, name: &str) -> bool {
        self.snapshot_path(name).exists()
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.snapshot_path(name);
        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted snapshot '{}'", name);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)? {
            let path = entry.map_err(RepositoryError::Io)?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::Tick;

    fn world() -> World {
        let mut world = World::new(11);
        world.add_room("crypt");
        world.clock = Tick(42);
        world
    }

    #[test]
    fn save_load_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSnapshotRepository::new(dir.path()).unwrap();

        let info = repo.save("crypt", &world()).unwrap();
        assert_eq!(info.clock, Tick(42));
        assert_eq!(info.checksum.len(), 64);

        assert_eq!(repo.load("crypt").unwrap(), Some(world()));
        assert_eq!(repo.list().unwrap(), vec!["crypt".to_string()]);
        assert!(repo.exists("crypt"));

        repo.delete("crypt").unwrap();
        assert_eq!(repo.load("crypt").unwrap(), None);
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSnapshotRepository::new(dir.path()).unwrap();
        repo.save("crypt", &world()).unwrap();

        let path = repo.snapshot_path("crypt");
        let mut bytes = fs::read(&path).unwrap();
        if let Some(byte) = bytes.last_mut() {
            *byte ^= 0x55;
        }
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            repo.load("crypt"),
            Err(RepositoryError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn export_writes_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSnapshotRepository::new(dir.path()).unwrap();
        repo.save("crypt", &world()).unwrap();

        let dest = dir.path().join("crypt.json");
        assert!(repo.export_json("crypt", &dest).unwrap());
        assert!(!repo.export_json("missing", dir.path().join("x.json")).unwrap());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dest).unwrap()).unwrap();
        assert_eq!(json["clock"], 42);
        assert_eq!(json["seed"], 11);
    }
}
