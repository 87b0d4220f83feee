//! Ability catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::{AbilityCatalog, AbilityDescriptor};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Ability file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityFile {
    pub abilities: Vec<AbilityDescriptor>,
}

/// Loader for ability descriptors from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    /// Load an ability catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<AbilityCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse an ability catalog from RON text.
    ///
    /// Keys must be unique and non-empty, and heal ranges ordered.
    pub fn parse(content: &str) -> LoadResult<AbilityCatalog> {
        let file: AbilityFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability catalog RON: {}", e))?;

        let mut seen = BTreeSet::new();
        for descriptor in &file.abilities {
            validate(descriptor)?;
            if !seen.insert(descriptor.key.clone()) {
                anyhow::bail!("Duplicate ability key: {}", descriptor.key);
            }
        }

        Ok(file.abilities.into_iter().collect())
    }
}

fn validate(descriptor: &AbilityDescriptor) -> LoadResult<()> {
    if descriptor.key.as_str().is_empty() {
        anyhow::bail!("Ability '{}' has an empty key", descriptor.name);
    }
    if let combat_core::AbilityRole::Heal { min, max } = descriptor.role
        && min > max
    {
        anyhow::bail!("Ability {} heals {}..{}", descriptor.key, min, max);
    }
    for range in &descriptor.damage {
        if range.min > range.max {
            anyhow::bail!(
                "Ability {} deals {}..{} {} damage",
                descriptor.key,
                range.min,
                range.max,
                range.damage_type
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{AbilityRole, EffectKind, Targeting, TileApply};

    #[test]
    fn parses_defaults_and_nested_enums() {
        let catalog = AbilityLoader::parse(
            r#"(
                abilities: [
                    (key: "mend", name: "Mend", role: Heal(min: 2, max: 4)),
                    (
                        key: "cloud",
                        name: "Cloud",
                        targeting: Tile,
                        offensive: true,
                        area: Some((
                            length: 2,
                            width: 2,
                            tile: (name: "cloud", apply: SuppressAttacks, duration: 6),
                        )),
                        effects: [
                            (key: "Choking", kind: DamageOverTime((damage_type: Poison, min: 1, max: 1)), duration: Some(6)),
                        ],
                    ),
                ],
            )"#,
        )
        .unwrap();

        let mend = catalog.get(&"mend".into()).unwrap();
        assert_eq!(mend.role, AbilityRole::Heal { min: 2, max: 4 });
        assert_eq!(mend.ap_cost, 1);
        assert_eq!(mend.range, 1);
        assert!(mend.must_target_living);

        let cloud = catalog.get(&"cloud".into()).unwrap();
        assert_eq!(cloud.targeting, Targeting::Tile);
        assert_eq!(cloud.area.as_ref().unwrap().tile.apply, TileApply::SuppressAttacks);
        assert!(matches!(cloud.effects[0].kind, EffectKind::DamageOverTime(_)));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = AbilityLoader::parse(
            r#"(abilities: [(key: "a", name: "A"), (key: "a", name: "B")])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn rejects_inverted_damage_ranges() {
        let err = AbilityLoader::parse(
            r#"(abilities: [(key: "a", name: "A", damage: [(damage_type: Fire, min: 5, max: 2)])])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("damage"));
    }
}
