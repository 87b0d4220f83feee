//! Entity records.
//!
//! Player characters and creatures share one [`Entity`] record; the
//! [`EntityKind`] and the optional AI profile tell them apart.

use std::collections::BTreeMap;

use super::{Attributes, Equipment, ItemId, Pool, ResourceKind, RoomId};
use crate::ability::AbilityKey;
use crate::effect::EffectSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Character,
    Npc,
}

/// What happens when the entity's health reaches zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathPolicy {
    /// Leaves a corpse and returns home after `respawn_secs`.
    Dies { respawn_secs: u32 },
    /// Stays in place with zero health until revived.
    KnocksOut,
}

/// Tunables for AI-controlled entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiProfile {
    /// Health percentage under which the entity tries to heal itself.
    pub heal_below_pct: u32,
    pub uses_items: bool,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            heal_below_pct: 25,
            uses_items: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarryLimits {
    pub max_weight: u32,
    pub max_items: u32,
}

impl Default for CarryLimits {
    fn default() -> Self {
        Self {
            max_weight: crate::config::CombatConfig::BASE_CARRY_WEIGHT,
            max_items: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Current room. `None` while dead and waiting to respawn.
    pub location: Option<RoomId>,
    pub home: Option<RoomId>,
    pub level: u32,
    pub attributes: Attributes,
    pub hp: Pool,
    pub mana: Pool,
    pub stamina: Pool,
    pub equipment: Equipment,
    /// Carried items, worn ones included.
    pub inventory: Vec<ItemId>,
    pub abilities: Vec<AbilityKey>,
    /// Remaining cooldown seconds per ability.
    pub cooldowns: BTreeMap<AbilityKey, u32>,
    pub effects: EffectSet,
    pub hostile_to_players: bool,
    pub death_policy: DeathPolicy,
    pub carry: CarryLimits,
    pub gold: u32,
    /// Accumulated experience. `None` for entities that never level.
    pub experience: Option<u64>,
    /// Experience granted to the opposing side on defeat.
    pub defeat_experience: u64,
    pub ai: Option<AiProfile>,
    /// Action points granted at the start of each turn. `None` uses the
    /// configured default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ap_per_turn: Option<u8>,
    pub knocked_out: bool,
    /// Elevated entities ignore cooldowns.
    pub elevated: bool,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            location: None,
            home: None,
            level: 1,
            attributes: Attributes::uniform(10),
            hp: Pool::default(),
            mana: Pool::default(),
            stamina: Pool::default(),
            equipment: Equipment::empty(),
            inventory: Vec::new(),
            abilities: Vec::new(),
            cooldowns: BTreeMap::new(),
            effects: EffectSet::new(),
            hostile_to_players: matches!(kind, EntityKind::Npc),
            death_policy: match kind {
                EntityKind::Character => DeathPolicy::KnocksOut,
                EntityKind::Npc => DeathPolicy::Dies {
                    respawn_secs: crate::config::CombatConfig::DEFAULT_RESPAWN_DELAY,
                },
            },
            carry: CarryLimits::default(),
            gold: 0,
            experience: match kind {
                EntityKind::Character => Some(0),
                EntityKind::Npc => None,
            },
            defeat_experience: 0,
            ai: match kind {
                EntityKind::Character => None,
                EntityKind::Npc => Some(AiProfile::default()),
            },
            ap_per_turn: None,
            knocked_out: false,
            elevated: false,
        }
    }

    pub fn action_points(&self, default: u8) -> u8 {
        self.ap_per_turn.unwrap_or(default)
    }

    pub fn pool(&self, resource: ResourceKind) -> &Pool {
        match resource {
            ResourceKind::Hp => &self.hp,
            ResourceKind::Mana => &self.mana,
            ResourceKind::Stamina => &self.stamina,
        }
    }

    pub fn pool_mut(&mut self, resource: ResourceKind) -> &mut Pool {
        match resource {
            ResourceKind::Hp => &mut self.hp,
            ResourceKind::Mana => &mut self.mana,
            ResourceKind::Stamina => &mut self.stamina,
        }
    }

    /// Able to take part in a fight: health left and not knocked out.
    pub fn is_standing(&self) -> bool {
        self.hp.current > 0 && !self.knocked_out
    }

    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    pub fn knows(&self, ability: &AbilityKey) -> bool {
        self.abilities.contains(ability)
    }

    pub fn cooldown(&self, ability: &AbilityKey) -> u32 {
        self.cooldowns.get(ability).copied().unwrap_or(0)
    }

    /// Winds every cooldown down by `secs`, dropping finished ones.
    pub fn tick_cooldowns(&mut self, secs: u32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(secs);
            *remaining > 0
        });
    }

    /// Glyph used on the combat grid.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}
