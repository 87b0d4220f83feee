//! Error infrastructure for the combat core.
//!
//! Every failure a player can provoke is a [`CombatError`]. They are all
//! raised before any state is touched, so a failed call leaves the world
//! exactly as it was and the caller keeps the attempted resources and action
//! points. Each error renders as the one-line message shown to the player.
//!
//! Broken internal invariants are not errors: the engine logs them with
//! `tracing::warn!` and heals the state (skip, merge or drop) instead.

use std::fmt;

use crate::ability::AbilityKey;
use crate::grid::GridError;
use crate::state::{Attribute, ComponentKind, EntityId, ItemId, ResourceKind};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed later (cooldown, AP, range)
/// - **Validation**: the request itself is malformed (unknown ids, bad target)
/// - **Internal**: the world disagrees with itself
/// - **Fatal**: the world cannot be used any more
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// Implementors derive `thiserror::Error` for their message and classify
/// themselves here so hosts can pick a logging level and a stable code.
pub trait GameError: fmt::Display + fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier of the variant, e.g. `"ON_COOLDOWN"`.
    fn error_code(&self) -> &'static str;
}

/// Time left on a cooldown, in the unit the caster currently thinks in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Remaining {
    Turns(u32),
    Seconds(u32),
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turns(1) => f.write_str("1 turn"),
            Self::Turns(n) => write!(f, "{n} turns"),
            Self::Seconds(1) => f.write_str("1 second"),
            Self::Seconds(n) => write!(f, "{n} seconds"),
        }
    }
}

/// Why a targeting contract was violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum TargetIssue {
    #[strum(to_string = "a target is required")]
    Missing,
    #[strum(to_string = "no such target")]
    NotFound,
    #[strum(to_string = "the target is not here")]
    NotHere,
    #[strum(to_string = "the target is already defeated")]
    Defeated,
    #[strum(to_string = "the target is not defeated")]
    NotDefeated,
    #[strum(to_string = "you can't target yourself")]
    Yourself,
    #[strum(to_string = "the target is not in this fight")]
    NotInFight,
    #[strum(to_string = "that cell is outside the battlefield")]
    OffGrid,
}

/// Effect or circumstance that forbids an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum BlockReason {
    #[strum(to_string = "a ceasefire is in effect")]
    Ceasefire,
    #[strum(to_string = "you are frozen")]
    Frozen,
    #[strum(to_string = "the swarm around you prevents it")]
    Swarm,
    #[strum(to_string = "you are stuck")]
    Stuck,
    #[strum(to_string = "you are knocked down")]
    KnockedDown,
    #[strum(to_string = "you are in combat")]
    InCombat,
    #[strum(to_string = "you are in no state to act")]
    Incapacitated,
}

/// Player-facing failures of combat operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("Not enough {0}!")]
    InsufficientResource(ResourceKind),

    #[error("{ability} is on cooldown for {remaining}.")]
    OnCooldown {
        ability: AbilityKey,
        remaining: Remaining,
    },

    #[error("Invalid target: {0}.")]
    InvalidTarget(TargetIssue),

    #[error("You lack a strong enough {0} component.")]
    MissingComponent(ComponentKind),

    #[error("That is out of range.")]
    OutOfRange,

    #[error("You can't do that: {0}.")]
    ActionBlocked(BlockReason),

    #[error("It is not your turn.")]
    TurnGated,

    #[error("You need {needed} action points but have {available}.")]
    NotEnoughActionPoints { needed: u8, available: u8 },

    #[error("There is no ability called {0}.")]
    UnknownAbility(AbilityKey),

    #[error("You don't know {0}.")]
    NotLearned(AbilityKey),

    #[error("You are not in combat.")]
    NotInCombat,

    #[error("There is no entity {0}.")]
    UnknownEntity(EntityId),

    #[error("You don't have {0}.")]
    UnknownItem(ItemId),

    #[error("You can't use that.")]
    NotUsable,

    #[error("You can't wear that.")]
    NotEquippable,

    #[error("You need level {0} to use that.")]
    LevelTooLow(u32),

    #[error("You need {1} {0} to use that.")]
    AttributeTooLow(Attribute, i32),

    #[error("You can't carry that much.")]
    OverCarryLimit,

    #[error("You can't move there.")]
    Movement(#[from] GridError),
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource(_)
            | Self::OnCooldown { .. }
            | Self::MissingComponent(_)
            | Self::OutOfRange
            | Self::ActionBlocked(_)
            | Self::TurnGated
            | Self::NotEnoughActionPoints { .. }
            | Self::OverCarryLimit
            | Self::Movement(_) => ErrorSeverity::Recoverable,
            Self::InvalidTarget(_)
            | Self::UnknownAbility(_)
            | Self::NotLearned(_)
            | Self::NotInCombat
            | Self::UnknownEntity(_)
            | Self::UnknownItem(_)
            | Self::NotUsable
            | Self::NotEquippable
            | Self::LevelTooLow(_)
            | Self::AttributeTooLow(..) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource(_) => "INSUFFICIENT_RESOURCE",
            Self::OnCooldown { .. } => "ON_COOLDOWN",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::MissingComponent(_) => "MISSING_COMPONENT",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::ActionBlocked(_) => "ACTION_BLOCKED",
            Self::TurnGated => "TURN_GATED",
            Self::NotEnoughActionPoints { .. } => "NOT_ENOUGH_AP",
            Self::UnknownAbility(_) => "UNKNOWN_ABILITY",
            Self::NotLearned(_) => "NOT_LEARNED",
            Self::NotInCombat => "NOT_IN_COMBAT",
            Self::UnknownEntity(_) => "UNKNOWN_ENTITY",
            Self::UnknownItem(_) => "UNKNOWN_ITEM",
            Self::NotUsable => "NOT_USABLE",
            Self::NotEquippable => "NOT_EQUIPPABLE",
            Self::LevelTooLow(_) => "LEVEL_TOO_LOW",
            Self::AttributeTooLow(..) => "ATTRIBUTE_TOO_LOW",
            Self::OverCarryLimit => "OVER_CARRY_LIMIT",
            Self::Movement(_) => "MOVEMENT_BLOCKED",
        }
    }
}

impl GameError for GridError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfBounds(_) => "OUT_OF_BOUNDS",
            Self::Occupied { .. } => "CELL_OCCUPIED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_message_names_the_pool() {
        let error = CombatError::InsufficientResource(ResourceKind::Mana);
        assert_eq!(error.to_string(), "Not enough mana!");
        assert!(error.severity().is_recoverable());
    }

    #[test]
    fn cooldown_message_uses_unit() {
        let error = CombatError::OnCooldown {
            ability: AbilityKey::from("fireball"),
            remaining: Remaining::Turns(2),
        };
        assert_eq!(error.to_string(), "fireball is on cooldown for 2 turns.");
        assert_eq!(error.error_code(), "ON_COOLDOWN");
    }

    #[test]
    fn blocked_message_explains_reason() {
        let error = CombatError::ActionBlocked(BlockReason::Ceasefire);
        assert_eq!(
            error.to_string(),
            "You can't do that: a ceasefire is in effect."
        );
    }
}
