//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Omitted fields keep their [`CombatConfig::new`] values.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.secs_per_turn == 0 {
            anyhow::bail!("secs_per_turn must be positive");
        }
        if config.unarmed_damage_min > config.unarmed_damage_max {
            anyhow::bail!(
                "Unarmed damage range {}..{} is inverted",
                config.unarmed_damage_min,
                config.unarmed_damage_max
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_keep_defaults() {
        let config = ConfigLoader::parse("turn_timeout = 45\n").unwrap();
        assert_eq!(config.turn_timeout, 45);
        assert_eq!(config.default_ap, CombatConfig::DEFAULT_AP);
    }

    #[test]
    fn rejects_zero_length_turns() {
        assert!(ConfigLoader::parse("secs_per_turn = 0\n").is_err());
    }
}
