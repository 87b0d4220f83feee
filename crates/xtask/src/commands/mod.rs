//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod clean;
mod inspect_snapshot;
mod list_content;
mod simulate;

pub use clean::Clean;
pub use inspect_snapshot::InspectSnapshot;
pub use list_content::ListContent;
pub use simulate::Simulate;
