use std::collections::BTreeMap;

use super::{AbilityDescriptor, AbilityKey};
use crate::env::AbilityOracle;

/// Immutable set of ability descriptors, keyed by [`AbilityKey`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityCatalog {
    abilities: BTreeMap<AbilityKey, AbilityDescriptor>,
}

impl AbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a descriptor under its own key.
    pub fn insert(&mut self, descriptor: AbilityDescriptor) -> Option<AbilityDescriptor> {
        self.abilities.insert(descriptor.key.clone(), descriptor)
    }

    pub fn with(mut self, descriptor: AbilityDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    pub fn get(&self, key: &AbilityKey) -> Option<&AbilityDescriptor> {
        self.abilities.get(key)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDescriptor> {
        self.abilities.values()
    }
}

impl FromIterator<AbilityDescriptor> for AbilityCatalog {
    fn from_iter<I: IntoIterator<Item = AbilityDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

impl AbilityOracle for AbilityCatalog {
    fn ability(&self, key: &AbilityKey) -> Option<&AbilityDescriptor> {
        self.get(key)
    }
}
