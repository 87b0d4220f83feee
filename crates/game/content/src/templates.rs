//! Item template registry.

use std::collections::BTreeMap;

use combat_core::{ItemId, ItemLocation, ItemTemplate, World};

/// Item templates keyed by their `key`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemTemplates {
    templates: BTreeMap<String, ItemTemplate>,
}

impl ItemTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template under its own key.
    pub fn insert(&mut self, template: ItemTemplate) -> Option<ItemTemplate> {
        self.templates.insert(template.key.clone(), template)
    }

    pub fn get(&self, key: &str) -> Option<&ItemTemplate> {
        self.templates.get(key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemTemplate> {
        self.templates.values()
    }

    /// Mints a fresh item from the template named `key`.
    pub fn mint(&self, world: &mut World, key: &str, location: ItemLocation) -> Option<ItemId> {
        let template = self.get(key)?;
        Some(world.mint_item(template, location))
    }
}

impl FromIterator<ItemTemplate> for ItemTemplates {
    fn from_iter<I: IntoIterator<Item = ItemTemplate>>(iter: I) -> Self {
        let mut templates = Self::new();
        for template in iter {
            templates.insert(template);
        }
        templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(key: &str) -> ItemTemplate {
        ItemTemplate {
            key: key.to_string(),
            name: key.to_string(),
            weight: 1,
            gear: None,
            components: BTreeMap::new(),
            use_fn: None,
        }
    }

    #[test]
    fn later_templates_replace_earlier_ones() {
        let mut first = template("rope");
        first.weight = 3;
        let templates: ItemTemplates = [first, template("rope"), template("torch")]
            .into_iter()
            .collect();

        assert_eq!(templates.len(), 2);
        assert_eq!(templates.get("rope").map(|t| t.weight), Some(1));
    }

    #[test]
    fn mint_places_the_item() {
        let templates: ItemTemplates = [template("torch")].into_iter().collect();
        let mut world = World::new(1);
        let room = world.add_room("cellar");

        let id = templates
            .mint(&mut world, "torch", ItemLocation::Room(room))
            .unwrap();

        assert_eq!(world.item(id).unwrap().location, ItemLocation::Room(room));
        assert!(templates.mint(&mut world, "lantern", ItemLocation::Nowhere).is_none());
    }
}
