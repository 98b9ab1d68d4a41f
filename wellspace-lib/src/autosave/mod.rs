//! Auto-save coordinator.
//!
//! Debounces editor snapshots and persists the most recent one through an
//! [`AutoSaveTarget`], publishing an [`AutoSaveStatus`] along the way.

mod config;
mod coordinator;

pub use config::*;
pub use coordinator::*;
