//! Content loaders for reading combat data from files.
//!
//! Abilities and items are RON, tables and configuration are TOML. Every
//! loader also has a `parse` entry point taking the file contents, which the
//! embedded standard content goes through.

pub mod abilities;
pub mod config;
pub mod factory;
pub mod item;
pub mod tables;

pub use abilities::AbilityLoader;
pub use config::ConfigLoader;
pub use factory::{Content, ContentFactory};
pub use item::ItemLoader;
pub use tables::TablesLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
