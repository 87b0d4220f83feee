//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

use runtime::RuntimeConfig;

/// Environment variable that overrides the snapshot directory.
pub const SNAPSHOT_DIR_ENV: &str = "COMBAT_SNAPSHOT_DIR";

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/combat/logs`
/// - Linux: `~/.cache/combat/logs` (or `$XDG_CACHE_HOME/combat/logs`)
/// - Windows: `%LOCALAPPDATA%\combat\logs`
/// - Fallback: `/tmp/combat/logs`
pub fn log_dir() -> PathBuf {
    let base_dir = directories::ProjectDirs::from("", "", "combat")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/combat"));

    base_dir.join("logs")
}

/// Snapshot directory: `$COMBAT_SNAPSHOT_DIR`, else the runtime's default.
pub fn snapshot_dir() -> PathBuf {
    std::env::var_os(SNAPSHOT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(RuntimeConfig::default_snapshot_dir)
}
