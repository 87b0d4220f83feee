//! Hit roll against evasion.

/// Result of one to-hit roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRoll {
    /// Raw `1..=100` roll.
    pub roll: u32,
    /// Roll plus bonuses, after the blindness penalty.
    pub attack: i32,
    pub evasion: u32,
    pub hit: bool,
}

/// Attack value of a roll.
///
/// ```text
/// attack = roll + weapon accuracy + Σ Accuracy modifiers
/// attack -= attack / 2        when Blinded
/// ```
pub fn attack_value(roll: u32, weapon_accuracy: i32, accuracy_mods: i32, blinded: bool) -> i32 {
    let attack = roll as i32 + weapon_accuracy + accuracy_mods;
    if blinded { attack - attack / 2 } else { attack }
}

/// Resolves a roll against the defender's evasion. Ties hit.
pub fn resolve_hit(
    roll: u32,
    weapon_accuracy: i32,
    accuracy_mods: i32,
    blinded: bool,
    evasion: u32,
) -> HitRoll {
    let attack = attack_value(roll, weapon_accuracy, accuracy_mods, blinded);
    HitRoll {
        roll,
        attack,
        evasion,
        hit: attack >= evasion as i32,
    }
}
