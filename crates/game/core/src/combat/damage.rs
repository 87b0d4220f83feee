//! Typed damage rolls, mitigation and application.

use tracing::debug;

use crate::effect::EffectKey;
use crate::engine::CombatEngine;
use crate::state::{DamageRange, DamageType, EntityId};

/// Which of the defender's tables reduces the damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mitigation {
    /// Weapon and unarmed attacks.
    Defense,
    /// Abilities.
    Resistance,
}

/// Damage dealt by one typed range after mitigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamagePart {
    pub damage_type: DamageType,
    pub amount: u32,
}

/// Mitigated damage of one typed part.
///
/// The bonus is added before the knockdown bonus (+50%), and the reduction
/// comes last. The result never goes below zero.
pub fn mitigate(raw: u32, bonus: i32, knocked_down: bool, reduction: u32) -> u32 {
    let mut value = (i64::from(raw) + i64::from(bonus)).max(0);
    if knocked_down {
        value += value / 2;
    }
    (value - i64::from(reduction)).max(0) as u32
}

/// `"Bob takes 7 slashing and 3 fire damage."`
pub fn damage_sentence(name: &str, parts: &[DamagePart]) -> String {
    let dealt: Vec<String> = parts
        .iter()
        .filter(|part| part.amount > 0)
        .map(|part| format!("{} {}", part.amount, part.damage_type))
        .collect();
    match dealt.as_slice() {
        [] => format!("{name} takes no damage."),
        [only] => format!("{name} takes {only} damage."),
        [init @ .., last] => format!("{name} takes {} and {last} damage.", init.join(", ")),
    }
}

/// Outcome of one damaging strike.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Strike {
    pub parts: Vec<DamagePart>,
    pub total: u32,
    pub defeated: bool,
}

impl<'a> CombatEngine<'a> {
    /// Rolls every range of an attack against `defender` without applying it.
    pub(crate) fn roll_damage(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        ranges: &[DamageRange],
        mitigation: Mitigation,
    ) -> Vec<DamagePart> {
        let bonus = self
            .stats(attacker)
            .map(|stats| stats.damage_bonus)
            .unwrap_or(0);
        let Some(defense) = self.stats(defender) else {
            return Vec::new();
        };
        let knocked_down = self.has_effect(defender, &EffectKey::KNOCKED_DOWN);

        ranges
            .iter()
            .map(|range| {
                let raw = self.roll(range.min, range.max);
                let reduction = match mitigation {
                    Mitigation::Defense => defense.defense_against(range.damage_type),
                    Mitigation::Resistance => defense.resistance_against(range.damage_type),
                };
                DamagePart {
                    damage_type: range.damage_type,
                    amount: mitigate(raw, bonus, knocked_down, reduction),
                }
            })
            .collect()
    }

    /// Rolls, announces and applies an attack's damage.
    pub(crate) fn strike(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        ranges: &[DamageRange],
        mitigation: Mitigation,
    ) -> Strike {
        let parts = self.roll_damage(attacker, defender, ranges, mitigation);
        let total = parts.iter().map(|part| part.amount).sum();
        let sentence = damage_sentence(&self.name(defender), &parts);
        self.say_near(defender, sentence);
        debug!(%attacker, %defender, total, ?mitigation, "damage dealt");
        let defeated = self.deal_damage(defender, total, Some(attacker));
        Strike {
            parts,
            total,
            defeated,
        }
    }

    /// Subtracts health and runs the defeat path at zero.
    ///
    /// Returns true when this damage defeated the target.
    pub(crate) fn deal_damage(
        &mut self,
        target: EntityId,
        amount: u32,
        source: Option<EntityId>,
    ) -> bool {
        if amount == 0 || !self.is_standing(target) {
            return false;
        }
        let Some(record) = self.world_mut().entity_mut(target) else {
            return false;
        };
        record.hp.drain(amount);
        if record.hp.current > 0 {
            return false;
        }
        self.defeat(target, source);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knockdown_adds_half_before_defense() {
        assert_eq!(mitigate(10, 0, true, 0), 15);
        assert_eq!(mitigate(10, 0, true, 5), 10);
        assert_eq!(mitigate(10, 2, false, 0), 12);
    }

    #[test]
    fn mitigation_floors_at_zero() {
        assert_eq!(mitigate(3, -5, false, 0), 0);
        assert_eq!(mitigate(3, 0, false, 10), 0);
    }

    #[test]
    fn sentence_lists_every_type() {
        let parts = [
            DamagePart {
                damage_type: DamageType::Slashing,
                amount: 7,
            },
            DamagePart {
                damage_type: DamageType::Fire,
                amount: 3,
            },
        ];
        assert_eq!(
            damage_sentence("Bob", &parts),
            "Bob takes 7 slashing and 3 fire damage."
        );
        assert_eq!(damage_sentence("Bob", &parts[..1]), "Bob takes 7 slashing damage.");
        assert_eq!(damage_sentence("Bob", &[]), "Bob takes no damage.");
    }
}
