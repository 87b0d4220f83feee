//! Stat tables loader.

use std::path::Path;

use combat_core::StatTables;

use crate::loaders::{LoadResult, read_file};

/// Loader for stat tables from TOML files.
pub struct TablesLoader;

impl TablesLoader {
    /// Load stat tables from a TOML file. Missing tables stay empty and read
    /// as zero.
    pub fn load(path: &Path) -> LoadResult<StatTables> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StatTables> {
        let tables: StatTables = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tables TOML: {}", e))?;

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tables_default_to_empty() {
        let tables = TablesLoader::parse("max_hp_base = 12\ndex_to_evade = [0, 3, 6]\n").unwrap();
        assert_eq!(tables.max_hp_base, 12);
        assert_eq!(tables.dex_to_evade, vec![0, 3, 6]);
        assert!(tables.con_to_max_hp.is_empty());
    }
}
