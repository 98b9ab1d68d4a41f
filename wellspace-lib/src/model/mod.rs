//! Domain types

mod session;
mod user;

pub use session::*;
pub use user::*;
