//! Timed and permanent effects attached to entities.
//!
//! An effect instance is owned by its target's [`EffectSet`] and dispatched
//! on [`EffectKind`]. Abilities, items, tiles and worn equipment create
//! instances from [`EffectTemplate`]s; the engine applies them once per
//! turn in combat and once per second outside of it.
//!
//! # Keys
//!
//! Effects are identified per target by an [`EffectKey`]. A target holds at
//! most one instance per key: re-applying a key refreshes the instance, and
//! stacking stat modifiers fold their amounts into it.

mod apply;
mod set;

pub use apply::PulseReport;
pub use set::{EffectSet, Insertion};

use std::borrow::Cow;
use std::fmt;

use crate::state::{
    Attribute, DamageRange, DamageType, EffectId, EntityId, ItemId, ResourceKind,
};

/// Name of an effect, unique per target.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EffectKey(Cow<'static, str>);

impl EffectKey {
    pub const KNOCKED_DOWN: Self = Self::from_static("Knocked Down");
    pub const FROZEN: Self = Self::from_static("Frozen");
    pub const BLINDED: Self = Self::from_static("Blinded");
    pub const CEASEFIRE: Self = Self::from_static("Ceasefire");
    pub const CURSED: Self = Self::from_static("Cursed");
    pub const AFRAID: Self = Self::from_static("Afraid");
    pub const STUCK: Self = Self::from_static("Stuck");
    pub const SLOWED: Self = Self::from_static("Slowed");
    pub const BURNING: Self = Self::from_static("Burning");
    pub const ARMOR_IGNORED: Self = Self::from_static("Armor Ignored");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Silent effects never announce that they wore off.
    pub fn is_silent(&self) -> bool {
        *self == Self::KNOCKED_DOWN
    }
}

impl fmt::Display for EffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EffectKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// Stat touched by a stat-modifier effect. Amounts are signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatTarget {
    Attribute(Attribute),
    Accuracy,
    Damage,
    Evasion,
    /// `None` applies to every damage type.
    Defense(Option<DamageType>),
    Resistance(Option<DamageType>),
    MaxResource(ResourceKind),
    /// Thousandths of a point per second.
    Regen(ResourceKind),
    /// Percentage of equipment defense ignored.
    ArmorIgnored,
}

impl fmt::Display for StatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(attribute) => write!(f, "{attribute}"),
            Self::Accuracy => f.write_str("Accuracy"),
            Self::Damage => f.write_str("Damage"),
            Self::Evasion => f.write_str("Evasion"),
            Self::Defense(None) => f.write_str("Defense"),
            Self::Defense(Some(kind)) => write!(f, "{kind} Defense"),
            Self::Resistance(None) => f.write_str("Resistance"),
            Self::Resistance(Some(kind)) => write!(f, "{kind} Resistance"),
            Self::MaxResource(kind) => write!(f, "Max {kind}"),
            Self::Regen(kind) => write!(f, "{kind} Regen"),
            Self::ArmorIgnored => f.write_str("Armor Ignored"),
        }
    }
}

/// Payload of a flag effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlagData {
    #[default]
    Plain,
    /// Dummy copy of a ceasefire whose expiry is driven by `origin`.
    Echo { origin: EntityId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    StatMod {
        stat: StatTarget,
        amount: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        stacking: bool,
    },
    DamageOverTime(DamageRange),
    Drain {
        resource: ResourceKind,
        min: u32,
        max: u32,
    },
    Regeneration {
        resource: ResourceKind,
        min: u32,
        max: u32,
    },
    /// Duration-only marker such as Frozen or Knocked Down.
    Flag(FlagData),
}

impl EffectKind {
    pub fn flag() -> Self {
        Self::Flag(FlagData::Plain)
    }

    pub fn stat(stat: StatTarget, amount: i32) -> Self {
        Self::StatMod {
            stat,
            amount,
            stacking: false,
        }
    }

    pub fn damage_type(&self) -> Option<DamageType> {
        match self {
            Self::DamageOverTime(range) => Some(range.damage_type),
            _ => None,
        }
    }

    /// Signed contribution to `target`, zero for non stat-mod kinds.
    pub fn stat_amount(&self, target: StatTarget) -> i32 {
        match self {
            Self::StatMod { stat, amount, .. } if *stat == target => *amount,
            _ => 0,
        }
    }
}

/// What created an effect instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectOrigin {
    Ability,
    Item,
    Tile,
    /// Passive of worn gear. Lives exactly as long as the item stays equipped.
    Equipment(ItemId),
    #[default]
    Environment,
}

impl EffectOrigin {
    /// The worn item behind a gear passive.
    pub fn item(self) -> Option<ItemId> {
        match self {
            Self::Equipment(item) => Some(item),
            _ => None,
        }
    }
}

/// Declarative effect description used by abilities, items and tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTemplate {
    pub key: EffectKey,
    pub kind: EffectKind,
    /// Seconds. `None` for permanent effects such as gear passives.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub positive: bool,
}

impl EffectTemplate {
    pub fn new(key: impl Into<EffectKey>, kind: EffectKind, duration: Option<u32>) -> Self {
        Self {
            key: key.into(),
            kind,
            duration,
            positive: false,
        }
    }

    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    pub fn instantiate(
        &self,
        id: EffectId,
        source: Option<EntityId>,
        target: EntityId,
        origin: EffectOrigin,
    ) -> EffectInstance {
        EffectInstance {
            id,
            key: self.key.clone(),
            kind: self.kind.clone(),
            source,
            target,
            origin,
            duration: self.duration,
            elapsed: 0,
            positive: self.positive,
            stacks: 1,
        }
    }
}

impl From<String> for EffectKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A live effect on one target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstance {
    pub id: EffectId,
    pub key: EffectKey,
    pub kind: EffectKind,
    pub source: Option<EntityId>,
    pub target: EntityId,
    pub origin: EffectOrigin,
    pub duration: Option<u32>,
    /// Seconds applied so far, never above `duration`.
    pub elapsed: u32,
    pub positive: bool,
    pub stacks: u32,
}

impl EffectInstance {
    pub fn is_timed(&self) -> bool {
        self.duration.is_some()
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.duration, Some(duration) if self.elapsed >= duration)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.duration.map(|duration| duration.saturating_sub(self.elapsed))
    }

    /// Advances elapsed time, capped at the duration.
    pub fn advance(&mut self, secs: u32) {
        if let Some(duration) = self.duration {
            self.elapsed = self.elapsed.saturating_add(secs).min(duration);
        }
    }

    pub fn echo_origin(&self) -> Option<EntityId> {
        match self.kind {
            EffectKind::Flag(FlagData::Echo { origin }) => Some(origin),
            _ => None,
        }
    }
}
