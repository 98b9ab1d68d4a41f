//! Session editor error types

use super::Error;
use crate::validation::FieldErrors;

/// Why an explicit save or publish did not go through.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EditorError {
    /// Local validation failed; nothing was sent.
    #[error("Please fix the errors before {action}")]
    Invalid {
        /// "saving" or "publishing".
        action: &'static str,
        /// Every failing field.
        errors: FieldErrors,
    },

    /// The request was sent and failed.
    #[error(transparent)]
    Request(#[from] Error),
}

impl EditorError {
    /// Field errors, from local validation or from the server.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid { errors, .. } => Some(errors),
            Self::Request(err) => err.field_errors(),
        }
    }
}
