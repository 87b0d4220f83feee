//! Declarative combat content and its loaders.
//!
//! This crate houses the standard ability set, item templates, stat tables
//! and combat configuration, and loads replacements from RON/TOML files:
//! - Ability descriptors (RON)
//! - Item templates (RON)
//! - Stat tables (TOML)
//! - Combat configuration (TOML)
//!
//! Content is read-only once loaded. The engine reaches it through
//! [`combat_core::CombatEnv`]; worlds only store keys and minted items.

pub mod templates;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use templates::ItemTemplates;

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityLoader, ConfigLoader, Content, ContentFactory, ItemLoader, LoadResult, TablesLoader,
};
