//! Session editor
//!
//! Ties the form controller, the session schema and the auto-save
//! coordinator together behind the operations a page calls: field edits,
//! explicit save and publish, and page lifecycle hooks.

mod actions;
mod orchestrator;

pub use actions::*;
pub use orchestrator::*;
