use std::collections::BTreeMap;

/// Closed set of damage types.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    /// Also accepted as "crushing" when parsed from text.
    #[strum(to_string = "blunt", serialize = "crushing")]
    Blunt,
    Slashing,
    Piercing,
    Arcane,
    Fire,
    Cold,
    Shock,
    Poison,
}

/// Inclusive damage roll for one damage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRange {
    pub damage_type: DamageType,
    pub min: u32,
    pub max: u32,
}

impl DamageRange {
    pub const fn new(damage_type: DamageType, min: u32, max: u32) -> Self {
        Self {
            damage_type,
            min,
            max,
        }
    }
}

/// Per-damage-type table with an untyped part that applies to every type.
///
/// Used for equipment defense and resistance tables as well as the derived
/// defense/resistance values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedTable {
    #[cfg_attr(feature = "serde", serde(default))]
    pub untyped: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub typed: BTreeMap<DamageType, i32>,
}

impl TypedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_untyped(mut self, value: i32) -> Self {
        self.untyped = value;
        self
    }

    pub fn with_typed(mut self, damage_type: DamageType, value: i32) -> Self {
        self.typed.insert(damage_type, value);
        self
    }

    /// Adds `value` to the untyped part when `damage_type` is `None`.
    pub fn add(&mut self, damage_type: Option<DamageType>, value: i32) {
        match damage_type {
            None => self.untyped += value,
            Some(kind) => *self.typed.entry(kind).or_default() += value,
        }
    }

    pub fn merge(&mut self, other: &TypedTable) {
        self.untyped += other.untyped;
        for (kind, value) in &other.typed {
            *self.typed.entry(*kind).or_default() += value;
        }
    }

    /// Total against one damage type: untyped plus the typed entry.
    pub fn against(&self, damage_type: DamageType) -> i32 {
        self.untyped + self.typed.get(&damage_type).copied().unwrap_or(0)
    }

    /// Scales every entry by `percent / 100`, rounding toward zero.
    pub fn scaled(&self, percent: i32) -> TypedTable {
        TypedTable {
            untyped: self.untyped * percent / 100,
            typed: self
                .typed
                .iter()
                .map(|(kind, value)| (*kind, value * percent / 100))
                .collect(),
        }
    }
}
