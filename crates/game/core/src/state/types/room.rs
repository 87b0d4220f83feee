use super::{EntityId, ItemId};

/// Opaque location hosting entities and loose items.
///
/// Rooms know nothing about combat; the battle in a room lives in the
/// world's battle table keyed by room id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub name: String,
    /// Entities in arrival order.
    pub occupants: Vec<EntityId>,
    pub items: Vec<ItemId>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occupants: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn enter(&mut self, entity: EntityId) {
        if !self.occupants.contains(&entity) {
            self.occupants.push(entity);
        }
    }

    pub fn leave(&mut self, entity: EntityId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|id| *id != entity);
        before != self.occupants.len()
    }
}
