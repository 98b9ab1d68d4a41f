//! Domain services behind the HTTP routes
//!
//! Services own the rules a route applies: which schema validates the
//! input, how input is sanitized, and which store call performs the write.
//! Route handlers only parse requests and encode results.

mod auth;
mod sessions;

pub use auth::*;
pub use sessions::*;
