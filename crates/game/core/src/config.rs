/// Combat configuration constants and tunable parameters.
///
/// Compile-time constants size bounded collections. The runtime-tunable
/// fields default to the `DEFAULT_*` values and can be overridden from a
/// TOML file through the content loaders.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Seconds of game time that one combat turn stands for.
    pub secs_per_turn: u32,
    /// Seconds a combatant has to act before the turn is forfeited.
    pub turn_timeout: u32,
    /// Period of the per-battle turn timer.
    pub turn_interval: u32,
    /// Remaining seconds at which the active combatant is warned once.
    pub warn_threshold: u32,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Upper bound for the distance between initiator and first target.
    pub max_engage_distance: u32,
    /// Action points granted at the start of a turn.
    pub default_ap: u8,
    /// Action points spent by attacking without a weapon.
    pub unarmed_ap: u8,
    /// Action points spent by using an item in combat.
    pub item_ap: u8,
    pub unarmed_damage_min: u32,
    pub unarmed_damage_max: u32,
    /// Delay between two AI decisions.
    pub ai_action_delay: u32,
    /// Delay between two AI decisions when the previous one was a step.
    pub ai_step_delay: u32,
    /// Delay before survivors look around after a victory.
    pub victory_look_delay: u32,
    /// Seconds before a defeated creature returns home.
    pub default_respawn_delay: u32,
    pub base_carry_weight: u32,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_OVERLAYS_PER_TILE: usize = 4;
    pub const MAX_GRID_SIDE: u32 = 64;
    /// AI decisions attempted within a single turn before it is forced to pass.
    pub const MAX_AI_DECISIONS_PER_TURN: u32 = 8;

    // ===== runtime-tunable defaults =====
    pub const SECS_PER_TURN: u32 = 3;
    pub const TURN_TIMEOUT: u32 = 30;
    pub const TURN_INTERVAL: u32 = 5;
    pub const WARN_THRESHOLD: u32 = 10;
    pub const GRID_SIDE: u32 = 16;
    pub const MAX_ENGAGE_DISTANCE: u32 = 8;
    pub const DEFAULT_AP: u8 = 2;
    pub const UNARMED_AP: u8 = 2;
    pub const ITEM_AP: u8 = 1;
    pub const UNARMED_DAMAGE: (u32, u32) = (1, 3);
    pub const AI_ACTION_DELAY: u32 = 2;
    pub const AI_STEP_DELAY: u32 = 1;
    pub const VICTORY_LOOK_DELAY: u32 = 3;
    pub const DEFAULT_RESPAWN_DELAY: u32 = 60;
    pub const BASE_CARRY_WEIGHT: u32 = 30;

    pub fn new() -> Self {
        Self {
            secs_per_turn: Self::SECS_PER_TURN,
            turn_timeout: Self::TURN_TIMEOUT,
            turn_interval: Self::TURN_INTERVAL,
            warn_threshold: Self::WARN_THRESHOLD,
            grid_width: Self::GRID_SIDE,
            grid_height: Self::GRID_SIDE,
            max_engage_distance: Self::MAX_ENGAGE_DISTANCE,
            default_ap: Self::DEFAULT_AP,
            unarmed_ap: Self::UNARMED_AP,
            item_ap: Self::ITEM_AP,
            unarmed_damage_min: Self::UNARMED_DAMAGE.0,
            unarmed_damage_max: Self::UNARMED_DAMAGE.1,
            ai_action_delay: Self::AI_ACTION_DELAY,
            ai_step_delay: Self::AI_STEP_DELAY,
            victory_look_delay: Self::VICTORY_LOOK_DELAY,
            default_respawn_delay: Self::DEFAULT_RESPAWN_DELAY,
            base_carry_weight: Self::BASE_CARRY_WEIGHT,
        }
    }

    /// Converts a duration in seconds to whole turns, rounding up.
    pub fn secs_to_turns(&self, secs: u32) -> u32 {
        let per_turn = self.secs_per_turn.max(1);
        secs.div_ceil(per_turn)
    }

    /// Clamps the configured grid to the supported side length.
    pub fn grid_dimensions(&self) -> (u32, u32) {
        (
            self.grid_width.clamp(1, Self::MAX_GRID_SIDE),
            self.grid_height.clamp(1, Self::MAX_GRID_SIDE),
        )
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
