//! Declarative ability descriptors and the cast pipeline.
//!
//! An ability is data: targeting, costs, cooldown, range, optional area
//! footprint, spell-component requirements and what it does on resolve.
//! Descriptors live in an [`AbilityCatalog`] that the engine reads through
//! [`crate::env::AbilityOracle`]; entities only store the keys they learned.
//!
//! # Pipeline
//!
//! ```text
//! learned → turn gate → blocked → resource → cooldown → target/range
//!         → components → action points → commit → start fight
//! ```
//!
//! Everything up to the action-point check is side-effect free and is exposed
//! as [`CombatEngine::check_ability`](crate::engine::CombatEngine::check_ability)
//! so the AI can ask whether a cast would succeed.

mod cast;
mod catalog;

pub use cast::{CastOutcome, CastPlan};
pub use catalog::AbilityCatalog;

use std::borrow::Cow;
use std::fmt;

use crate::effect::EffectTemplate;
use crate::grid::TileTemplate;
use crate::state::{ComponentKind, DamageRange, EntityId, Position, ResourceKind};

/// Stable lookup key of an ability, e.g. `"fireball"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityKey(Cow<'static, str>);

impl AbilityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for AbilityKey {
    fn from(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl From<String> for AbilityKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// What an ability is aimed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Targeting {
    /// Always the caster.
    SelfOnly,
    #[default]
    Entity,
    /// A grid cell. Only usable in a battle.
    Tile,
    None,
}

/// Target handed to a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityTarget {
    None,
    Entity(EntityId),
    Tile(Position),
}

impl AbilityTarget {
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceCost {
    pub resource: ResourceKind,
    pub amount: u32,
}

/// Special resolution besides damage and effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityRole {
    #[default]
    Standard,
    /// Restores `min..=max` health. The AI looks for these when hurt.
    Heal { min: u32, max: u32 },
    /// Brings a knocked-out target back on its feet.
    Revive,
}

/// Minimum strength of one component kind a cast consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentRequirement {
    pub kind: ComponentKind,
    pub strength: u32,
}

/// Area footprint of a tile ability.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaSpec {
    pub length: u32,
    pub width: u32,
    pub tile: TileTemplate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityDescriptor {
    pub key: AbilityKey,
    pub name: String,
    pub targeting: Targeting,
    pub must_target_living: bool,
    pub ap_cost: u8,
    pub cost: Option<ResourceCost>,
    /// Seconds.
    pub cooldown: u32,
    pub offensive: bool,
    /// Squares, Chebyshev distance.
    pub range: u32,
    pub area: Option<AreaSpec>,
    pub components: Vec<ComponentRequirement>,
    pub effects: Vec<EffectTemplate>,
    pub damage: Vec<DamageRange>,
    pub role: AbilityRole,
}

impl Default for AbilityDescriptor {
    fn default() -> Self {
        Self {
            key: AbilityKey::from(""),
            name: String::new(),
            targeting: Targeting::Entity,
            must_target_living: true,
            ap_cost: 1,
            cost: None,
            cooldown: 0,
            offensive: false,
            range: 1,
            area: None,
            components: Vec::new(),
            effects: Vec::new(),
            damage: Vec::new(),
            role: AbilityRole::Standard,
        }
    }
}

impl AbilityDescriptor {
    pub fn new(key: impl Into<AbilityKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_heal(&self) -> bool {
        matches!(self.role, AbilityRole::Heal { .. })
    }

    /// Whether the ability can be aimed at the caster.
    pub fn targets_self(&self) -> bool {
        match self.targeting {
            Targeting::SelfOnly => true,
            Targeting::Entity => !self.offensive,
            Targeting::Tile | Targeting::None => false,
        }
    }
}
