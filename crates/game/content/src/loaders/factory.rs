//! Content factory for assembling a complete rule set.

use std::path::{Path, PathBuf};

use combat_core::{AbilityCatalog, CombatConfig, CombatEnv, StatTables};
use tracing::debug;

use crate::loaders::{AbilityLoader, ConfigLoader, ItemLoader, LoadResult, TablesLoader};
use crate::templates::ItemTemplates;

const STANDARD_ABILITIES: &str = include_str!("../../data/abilities.ron");
const STANDARD_ITEMS: &str = include_str!("../../data/items.ron");
const STANDARD_TABLES: &str = include_str!("../../data/tables.toml");
const STANDARD_CONFIG: &str = include_str!("../../data/config.toml");

/// Everything the engine reads but never writes.
#[derive(Clone, Debug, Default)]
pub struct Content {
    pub abilities: AbilityCatalog,
    pub items: ItemTemplates,
    pub tables: StatTables,
    pub config: CombatConfig,
}

impl Content {
    /// Borrows the rule set as an engine environment.
    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(&self.abilities, &self.tables, &self.config)
    }
}

/// Content factory that loads combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── tables.toml
/// ├── abilities.ron
/// └── items.ron
/// ```
///
/// Files missing from the directory fall back to the embedded standard
/// content.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The standard rule set compiled into the crate.
    pub fn standard() -> LoadResult<Content> {
        Ok(Content {
            abilities: AbilityLoader::parse(STANDARD_ABILITIES)?,
            items: ItemLoader::parse(STANDARD_ITEMS)?,
            tables: TablesLoader::parse(STANDARD_TABLES)?,
            config: ConfigLoader::parse(STANDARD_CONFIG)?,
        })
    }

    /// Load combat configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        self.load_or("config.toml", ConfigLoader::load, || {
            ConfigLoader::parse(STANDARD_CONFIG)
        })
    }

    /// Load stat tables from `tables.toml`.
    pub fn load_tables(&self) -> LoadResult<StatTables> {
        self.load_or("tables.toml", TablesLoader::load, || {
            TablesLoader::parse(STANDARD_TABLES)
        })
    }

    /// Load the ability catalog from `abilities.ron`.
    pub fn load_abilities(&self) -> LoadResult<AbilityCatalog> {
        self.load_or("abilities.ron", AbilityLoader::load, || {
            AbilityLoader::parse(STANDARD_ABILITIES)
        })
    }

    /// Load item templates from `items.ron`.
    pub fn load_items(&self) -> LoadResult<ItemTemplates> {
        self.load_or("items.ron", ItemLoader::load, || {
            ItemLoader::parse(STANDARD_ITEMS)
        })
    }

    /// Load every content file.
    pub fn load(&self) -> LoadResult<Content> {
        Ok(Content {
            abilities: self.load_abilities()?,
            items: self.load_items()?,
            tables: self.load_tables()?,
            config: self.load_config()?,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn load_or<T>(
        &self,
        file: &str,
        load: impl FnOnce(&Path) -> LoadResult<T>,
        fallback: impl FnOnce() -> LoadResult<T>,
    ) -> LoadResult<T> {
        let path = self.data_dir.join(file);
        if path.exists() {
            load(&path)
        } else {
            debug!(path = %path.display(), "content file missing; using standard content");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{
        AbilityRole, CombatEngine, ComponentKind, Entity, EntityKind, ItemLocation, ItemUse,
        ResourceKind, TileApply, World,
    };

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn standard_content_parses() {
        let content = ContentFactory::standard().unwrap();

        for key in [
            "fireball",
            "frost_bolt",
            "heal",
            "revive",
            "knockdown_strike",
            "blinding_flash",
            "terrify",
            "entangle",
            "ceasefire",
            "haste_curse",
            "swarm",
            "poison_dart",
        ] {
            assert!(content.abilities.get(&key.into()).is_some(), "missing {key}");
        }
        assert_eq!(content.config, CombatConfig::new());
        assert_eq!(content.tables, StatTables::standard());
    }

    #[test]
    fn standard_content_keeps_its_shapes() {
        let content = ContentFactory::standard().unwrap();

        let heal = content.abilities.get(&"heal".into()).unwrap();
        assert!(matches!(heal.role, AbilityRole::Heal { .. }));
        let revive = content.abilities.get(&"revive".into()).unwrap();
        assert!(!revive.must_target_living);
        let swarm = content.abilities.get(&"swarm".into()).unwrap();
        assert_eq!(swarm.area.as_ref().unwrap().tile.apply, TileApply::SuppressAttacks);

        assert_eq!(
            content.items.get("mend_wounds").unwrap().use_fn,
            Some(ItemUse::Heal { min: 10, max: 15 })
        );
        assert_eq!(
            content.items.get("nightshade").unwrap().components.get(&ComponentKind::Poison),
            Some(&7)
        );
        let spear = content.items.get("spear").unwrap();
        assert_eq!(spear.gear.as_ref().unwrap().weapon.as_ref().unwrap().range, 2);
    }

    #[test]
    fn missing_files_fall_back_to_standard_content() {
        let factory = ContentFactory::new("/nonexistent/combat-data");
        let content = factory.load().unwrap();
        assert_eq!(content.abilities.len(), ContentFactory::standard().unwrap().abilities.len());
    }

    #[test]
    fn content_drives_an_engine() {
        let content = ContentFactory::standard().unwrap();
        let mut world = World::new(3);
        let room = world.add_room("yard");
        let mut engine = CombatEngine::new(&mut world, content.env());

        let ann = engine.spawn(Entity::new("Ann", EntityKind::Character), room);
        let max_hp = engine.stats(ann).unwrap().max(ResourceKind::Hp);
        assert!(max_hp > 0);
        assert_eq!(engine.world().entity(ann).unwrap().hp.current, max_hp);

        let potion = content
            .items
            .mint(&mut world, "mend_wounds", ItemLocation::Carried(ann))
            .unwrap();
        assert_eq!(world.item(potion).unwrap().location, ItemLocation::Carried(ann));
    }
}
