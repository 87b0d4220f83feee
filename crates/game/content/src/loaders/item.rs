//! Item template loader.

use std::path::Path;

use combat_core::ItemTemplate;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};
use crate::templates::ItemTemplates;

/// Item file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFile {
    pub items: Vec<ItemTemplate>,
}

/// Loader for item templates from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load item templates from a RON file.
    pub fn load(path: &Path) -> LoadResult<ItemTemplates> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse item templates from RON text.
    pub fn parse(content: &str) -> LoadResult<ItemTemplates> {
        let file: ItemFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item templates RON: {}", e))?;

        let mut templates = ItemTemplates::new();
        for template in file.items {
            if template.key.is_empty() {
                anyhow::bail!("Item '{}' has an empty key", template.name);
            }
            if let Some(weapon) = template.gear.as_ref().and_then(|gear| gear.weapon.as_ref())
                && weapon.damage.is_empty()
            {
                anyhow::bail!("Weapon {} deals no damage", template.key);
            }
            let key = template.key.clone();
            if templates.insert(template).is_some() {
                anyhow::bail!("Duplicate item key: {}", key);
            }
        }

        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{ComponentKind, EquipSlot, ItemUse};

    #[test]
    fn parses_gear_components_and_uses() {
        let templates = ItemLoader::parse(
            r#"(
                items: [
                    (key: "bane", name: "a bane leaf", components: {Poison: 2}),
                    (key: "tonic", name: "a tonic", use_fn: Some(Heal(min: 1, max: 2))),
                    (
                        key: "club",
                        name: "a club",
                        weight: 5,
                        gear: Some((
                            slot: Primary,
                            weapon: Some((damage: [(damage_type: Blunt, min: 1, max: 4)], ap_to_attack: 1, range: 1)),
                        )),
                    ),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(templates.get("bane").unwrap().components.get(&ComponentKind::Poison), Some(&2));
        assert_eq!(
            templates.get("tonic").unwrap().use_fn,
            Some(ItemUse::Heal { min: 1, max: 2 })
        );
        let club = templates.get("club").unwrap();
        assert_eq!(club.weight, 5);
        assert_eq!(club.gear.as_ref().unwrap().slot, EquipSlot::Primary);
    }

    #[test]
    fn rejects_weapons_without_damage() {
        let err = ItemLoader::parse(
            r#"(items: [(key: "stick", name: "a stick", gear: Some((slot: Primary, weapon: Some((damage: [], ap_to_attack: 1, range: 1)))))])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no damage"));
    }
}
