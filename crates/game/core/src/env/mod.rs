//! Read-only context handed to the engine.
//!
//! The ability catalog, stat tables and configuration never change while a
//! world runs. [`CombatEnv`] bundles references to them so every engine call
//! sees the same rules without the world owning them.
mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed};

use crate::ability::{AbilityDescriptor, AbilityKey};
use crate::config::CombatConfig;
use crate::stats::StatTables;

/// Lookup of ability descriptors by key.
pub trait AbilityOracle {
    fn ability(&self, key: &AbilityKey) -> Option<&AbilityDescriptor>;
}

/// Aggregates the immutable rules the engine consults.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub abilities: &'a dyn AbilityOracle,
    pub tables: &'a StatTables,
    pub config: &'a CombatConfig,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        abilities: &'a dyn AbilityOracle,
        tables: &'a StatTables,
        config: &'a CombatConfig,
    ) -> Self {
        Self {
            abilities,
            tables,
            config,
        }
    }

    pub fn ability(&self, key: &AbilityKey) -> Option<&'a AbilityDescriptor> {
        self.abilities.ability(key)
    }
}

impl std::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
