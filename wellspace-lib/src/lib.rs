//! Wellspace core library
//!
//! Validation, form state, auto-save coordination and the session editor,
//! together with the persistence, auth and service layers the HTTP server
//! is built from.

pub mod auth;
pub mod autosave;
pub mod editor;
pub mod error;
pub mod form;
pub mod model;
pub mod notice;
pub mod response;
pub mod retry;
pub mod service;
pub mod store;
pub mod validation;

mod client;

pub use client::*;
pub use error::Error;
pub use error::ErrorKind;
pub use response::ApiResponse;
