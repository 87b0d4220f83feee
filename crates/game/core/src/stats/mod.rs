//! Stat pipeline.
//!
//! # Architecture
//!
//! ```text
//! [ Base attributes + level ]
//!      ↓  + Σ attribute modifiers (floored at 0)
//! [ Effective attributes ]
//!      ↓  table lookups
//! [ Base derived values ]
//!      ↓  + worn equipment
//!      ↓  + Σ stat modifiers, Armor Ignored, Slowed
//! [ DerivedStats ]
//! ```
//!
//! ## Principles
//!
//! 1. **Pure**: [`DerivedStats::compute`] depends only on level, base
//!    attributes, worn gear and the effect set. Nothing is cached.
//! 2. **Integer only**: every value is an integer; regeneration is expressed
//!    in thousandths of a point per second.
//! 3. **Tables saturate**: a lookup past the end of a table uses its last
//!    value.

mod derived;
mod tables;

pub use derived::DerivedStats;
pub use tables::{StatTables, lookup};
