//! Ordered id → record storage.
//!
//! Every cross-link in the world is an id that is re-resolved on use, so a
//! destroyed record simply stops resolving instead of dangling.

use std::collections::BTreeMap;

use super::RegistryId;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registry<K: RegistryId, V> {
    records: BTreeMap<K, V>,
    next_id: u32,
}

impl<K: RegistryId, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<K: RegistryId, V> Registry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next id without storing anything under it.
    pub fn allocate(&mut self) -> K {
        let id = K::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Allocates an id and stores the record built for it.
    pub fn insert_with(&mut self, build: impl FnOnce(K) -> V) -> K {
        let id = self.allocate();
        self.records.insert(id, build(id));
        id
    }

    /// Stores a record under an explicit id, bumping the allocator past it.
    pub fn insert_at(&mut self, id: K, value: V) -> Option<V> {
        self.next_id = self.next_id.max(id.raw() + 1);
        self.records.insert(id, value)
    }

    pub fn get(&self, id: K) -> Option<&V> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.records.get_mut(&id)
    }

    pub fn remove(&mut self, id: K) -> Option<V> {
        self.records.remove(&id)
    }

    pub fn contains(&self, id: K) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.records.iter().map(|(id, value)| (*id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.records.iter_mut().map(|(id, value)| (*id, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityId;

    #[test]
    fn insert_at_moves_allocator_forward() {
        let mut registry: Registry<EntityId, &str> = Registry::new();
        registry.insert_at(EntityId(10), "ogre");
        let next = registry.insert_with(|_| "rat");
        assert_eq!(next, EntityId(11));
        assert_eq!(registry.get(EntityId(10)), Some(&"ogre"));
    }

    #[test]
    fn removed_ids_stop_resolving() {
        let mut registry: Registry<EntityId, u8> = Registry::new();
        let id = registry.insert_with(|_| 1);
        assert!(registry.remove(id).is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.remove(id).is_none());
    }
}
