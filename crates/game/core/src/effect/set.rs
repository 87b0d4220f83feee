use super::{EffectInstance, EffectKey, EffectKind, EffectOrigin, StatTarget};
use crate::state::{EffectId, EntityId, ItemId};

/// Result of inserting an instance into an [`EffectSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// A new instance was appended.
    Added(EffectId),
    /// An instance with the same key was refreshed in place.
    Refreshed(EffectId),
    /// A stacking stat modifier absorbed the new amount.
    Stacked(EffectId),
}

impl Insertion {
    pub fn id(self) -> EffectId {
        match self {
            Self::Added(id) | Self::Refreshed(id) | Self::Stacked(id) => id,
        }
    }
}

/// Effects on one entity in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSet {
    effects: Vec<EffectInstance>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an instance, keeping at most one instance per key and
    /// granting item.
    ///
    /// Each worn item holds its own copy of a passive, apart from other
    /// items and from timed effects under the same key. Re-applying a key
    /// resets elapsed time and replaces the duration and source. Stacking
    /// stat modifiers also add their amount to the existing one; every other
    /// kind is replaced by the new instance. A refreshed instance keeps its
    /// id and its position in creation order.
    pub fn insert(&mut self, instance: EffectInstance) -> Insertion {
        let item = instance.origin.item();
        let Some(existing) = self
            .effects
            .iter_mut()
            .find(|e| e.key == instance.key && e.origin.item() == item)
        else {
            let id = instance.id;
            self.effects.push(instance);
            return Insertion::Added(id);
        };

        existing.elapsed = 0;
        existing.duration = instance.duration;
        existing.source = instance.source;
        existing.origin = instance.origin;

        let stacks = match (&existing.kind, &instance.kind) {
            (
                EffectKind::StatMod {
                    stat,
                    stacking: true,
                    ..
                },
                EffectKind::StatMod { stat: new_stat, .. },
            ) => stat == new_stat,
            _ => false,
        };

        if stacks {
            if let EffectKind::StatMod { stat, amount, .. } = &mut existing.kind {
                *amount += instance.kind.stat_amount(*stat);
            }
            existing.stacks += 1;
            Insertion::Stacked(existing.id)
        } else {
            existing.kind = instance.kind;
            existing.positive = instance.positive;
            existing.stacks = 1;
            Insertion::Refreshed(existing.id)
        }
    }

    pub fn get(&self, key: &EffectKey) -> Option<&EffectInstance> {
        self.effects.iter().find(|e| &e.key == key)
    }

    pub fn get_by_id(&self, id: EffectId) -> Option<&EffectInstance> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn get_by_id_mut(&mut self, id: EffectId) -> Option<&mut EffectInstance> {
        self.effects.iter_mut().find(|e| e.id == id)
    }

    pub fn has(&self, key: &EffectKey) -> bool {
        self.get(key).is_some()
    }

    /// Removes the instance under `key`. Removing an absent key is a no-op.
    ///
    /// Gear passives stay until their item comes off.
    pub fn remove(&mut self, key: &EffectKey) -> Option<EffectInstance> {
        let index = self
            .effects
            .iter()
            .position(|e| &e.key == key && e.origin.item().is_none())?;
        Some(self.effects.remove(index))
    }

    pub fn remove_id(&mut self, id: EffectId) -> Option<EffectInstance> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index))
    }

    /// Removes every instance matching `predicate`, preserving the order of
    /// the survivors. Returns the removed instances in creation order.
    pub fn remove_where(
        &mut self,
        mut predicate: impl FnMut(&EffectInstance) -> bool,
    ) -> Vec<EffectInstance> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.effects.len());
        for effect in self.effects.drain(..) {
            if predicate(&effect) {
                removed.push(effect);
            } else {
                kept.push(effect);
            }
        }
        self.effects = kept;
        removed
    }

    /// Drops every timed effect. Gear passives survive.
    pub fn clear_timed(&mut self) -> Vec<EffectInstance> {
        self.remove_where(EffectInstance::is_timed)
    }

    /// Drops every effect created by `source` (dispel).
    pub fn clear_from_source(&mut self, source: EntityId) -> Vec<EffectInstance> {
        self.remove_where(|e| e.source == Some(source) && e.is_timed())
    }

    pub fn clear_from_item(&mut self, item: ItemId) -> Vec<EffectInstance> {
        self.remove_where(|e| e.origin == EffectOrigin::Equipment(item))
    }

    /// Signed sum of every modifier on `target`.
    pub fn stat_sum(&self, target: StatTarget) -> i32 {
        self.effects.iter().map(|e| e.kind.stat_amount(target)).sum()
    }

    /// Ids in creation order. Used to walk the set while mutating it.
    pub fn ids(&self) -> Vec<EffectId> {
        self.effects.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
