//! Validation schema engine.
//!
//! Declarative field rules evaluated by pure functions. The same schema
//! instances back the form controller and the server's route handlers.
//!
//! # Example
//!
//! ```
//! use wellspace_lib::validation::{schemas, validate_form, FormData};
//!
//! let form = FormData::new().with("title", "ab");
//! let result = validate_form(&form, &schemas::session());
//! assert!(!result.is_valid);
//! assert!(result.errors.get("title").is_some());
//! ```

mod engine;
mod rule;
mod sanitize;
pub mod schemas;
mod tags;
mod value;

pub use engine::*;
pub use rule::*;
pub use sanitize::*;
pub use tags::*;
pub use value::*;
