//! Error types

mod api;
mod auth;
mod editor;
mod store;

pub use api::*;
pub use auth::*;
pub use editor::*;
pub use store::*;
