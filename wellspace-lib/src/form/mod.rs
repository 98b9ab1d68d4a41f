//! Form-state controller.
//!
//! Per-field values, errors and touched tracking with debounced
//! revalidation, driven by a [`crate::validation::ValidationSchema`].

mod controller;

pub use controller::*;
