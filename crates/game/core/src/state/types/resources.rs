//! Resource pools (HP, Mana, Stamina).
//!
//! Regeneration arrives in thousandths of a point per second. The fractional
//! part is kept in `buildup` and converted to whole points once it reaches a
//! full point, so slow regeneration still makes progress at 1 Hz.

/// Thousandths in one whole resource point.
pub const BUILDUP_SCALE: u32 = 1000;

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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    #[strum(to_string = "health", serialize = "hp")]
    Hp,
    #[strum(to_string = "mana")]
    Mana,
    #[strum(to_string = "stamina")]
    Stamina,
}

/// Current value of one resource plus its fractional accumulator.
///
/// The maximum is not stored: it is derived from stats on demand, and
/// callers pass it in whenever the pool grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool {
    pub current: u32,
    /// Fractional progress toward the next point, in `[0, BUILDUP_SCALE)`.
    pub buildup: u32,
}

impl Pool {
    pub fn full(max: u32) -> Self {
        Self {
            current: max,
            buildup: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Adds up to `amount`, capped at `max`. Returns the amount applied.
    pub fn restore(&mut self, amount: u32, max: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(max);
        self.current.saturating_sub(before)
    }

    /// Removes up to `amount`, floored at zero. Returns the amount removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Re-applies the upper bound after the maximum shrank.
    pub fn clamp(&mut self, max: u32) {
        if self.current > max {
            self.current = max;
        }
    }

    /// Credits `rate` thousandths per second for `secs` seconds.
    ///
    /// Whole points are added up to `max`; the remainder stays in buildup.
    /// A full pool still keeps its buildup below one point. Returns the
    /// whole points gained.
    pub fn regenerate(&mut self, rate: u32, secs: u32, max: u32) -> u32 {
        let total = self.buildup + rate.saturating_mul(secs);
        let whole = total / BUILDUP_SCALE;
        self.buildup = total % BUILDUP_SCALE;
        self.restore(whole, max)
    }
}


#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn pool_stays_within_bounds(
            max in 0u32..500,
            start in 0u32..500,
            ops in proptest::collection::vec((0u8..3, 0u32..200), 0..32)
        ) {
            let mut pool = Pool { current: start.min(max), buildup: 0 };
            for (op, amount) in ops {
                match op {
                    0 => { pool.restore(amount, max); }
                    1 => { pool.drain(amount); }
                    _ => { pool.regenerate(amount * 10, 3, max); }
                }
                prop_assert!(pool.current <= max);
                prop_assert!(pool.buildup < BUILDUP_SCALE);
            }
        }
    }
}
