//! Application error taxonomy

use serde::Deserialize;
use serde::Serialize;

use super::AuthError;
use super::StoreError;
use crate::validation::FieldErrors;

/// Broad class of an [`Error`].
///
/// The class decides the HTTP status, the wire `code`, and whether a read
/// path may retry the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Field-level input problem the user can fix.
    Validation,
    /// Missing, invalid or expired token.
    Authentication,
    /// Authenticated, but not the owner.
    Authorization,
    /// The requested record does not exist.
    NotFound,
    /// Transport failure before a response arrived.
    Network,
    /// The server failed to handle the request.
    Server,
}

impl ErrorKind {
    /// HTTP status used when this class of error is returned by the server.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authentication => 401,
            Self::Authorization => 403,
            Self::NotFound => 404,
            Self::Network => 502,
            Self::Server => 500,
        }
    }

    /// Machine-readable code carried in failure responses.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Network => "NETWORK_ERROR",
            Self::Server => "SERVER_ERROR",
        }
    }

    /// Classifies an HTTP status received by a client.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 405 | 413 | 422 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Authorization,
            404 => Self::NotFound,
            _ => Self::Server,
        }
    }

    /// Only transport and server failures are worth repeating.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}

/// Errors surfaced by services, the API client and the editor.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// One or more fields failed validation.
    #[error("{message}")]
    Validation {
        /// Summary message, usually the first field error.
        message: String,
        /// Per-field messages.
        errors: FieldErrors,
    },

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Authentication(String),

    /// The caller does not own the record.
    #[error("{0}")]
    Authorization(String),

    /// Record not found.
    #[error("{0}")]
    NotFound(String),

    /// Request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server failed, or answered with something unreadable.
    #[error("{message}")]
    Server {
        /// HTTP status, 500 when produced locally.
        status: u16,
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a validation error with a summary message and no field map.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    /// Creates a validation error for a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field, message.clone());
        Self::Validation { message, errors }
    }

    /// Creates a validation error from a full field map.
    ///
    /// The summary message is the first field error, as the server reports it.
    pub fn from_field_errors(errors: FieldErrors) -> Self {
        let message = errors.first_message().unwrap_or("Validation failed").to_string();
        Self::Validation { message, errors }
    }

    /// Creates a server error with status 500.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: 500,
            message: message.into(),
        }
    }

    /// Rebuilds an error from its wire parts.
    pub fn from_parts(
        kind: ErrorKind,
        status: u16,
        message: impl Into<String>,
        errors: Option<FieldErrors>,
    ) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Validation => Self::Validation {
                message,
                errors: errors.unwrap_or_default(),
            },
            ErrorKind::Authentication => Self::Authentication(message),
            ErrorKind::Authorization => Self::Authorization(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Network => Self::Network(message),
            ErrorKind::Server => Self::Server { status, message },
        }
    }

    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Server { status, .. } => *status,
            other => other.kind().status_code(),
        }
    }

    /// Returns the field errors of a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Returns `true` if a read path may repeat the request.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::server(format!("Unreadable response: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => Self::NotFound(format!("{entity} not found")),
            StoreError::Forbidden { entity } => {
                Self::Authorization(format!("You do not have permission to modify this {entity}"))
            }
            StoreError::Conflict(message) => Self::validation(message),
            other => {
                log::error!("Store failure: {other}");
                Self::server("Internal server error")
            }
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hashing(_) | AuthError::MissingSecret => {
                log::error!("Auth failure: {err}");
                Self::server("Internal server error")
            }
            _ => Self::Authentication("Invalid or expired token".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_and_server_retry() {
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(Error::server("boom").is_retryable());
        assert!(!Error::validation("bad").is_retryable());
        assert!(!Error::Authentication("no".into()).is_retryable());
        assert!(!Error::Authorization("no".into()).is_retryable());
        assert!(!Error::NotFound("gone".into()).is_retryable());
    }

    #[test]
    fn test_from_field_errors_uses_first_message() {
        let mut errors = FieldErrors::new();
        errors.insert("title", "Title is required");
        let err = Error::from_field_errors(errors);
        assert_eq!(err.to_string(), "Title is required");
        assert_eq!(err.status_code(), 400);

        let err = Error::from_field_errors(FieldErrors::new());
        assert_eq!(err.to_string(), "Validation failed");
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let err: Error = StoreError::Forbidden { entity: "session" }.into();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err: Error = StoreError::NotFound { entity: "Session" }.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Session not found");

        let err: Error = StoreError::Corrupt("bad tags".into()).into();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_from_parts_round_trips_kind() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Authentication,
            ErrorKind::Authorization,
            ErrorKind::NotFound,
            ErrorKind::Network,
            ErrorKind::Server,
        ] {
            let err = Error::from_parts(kind, kind.status_code(), "x", None);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Authorization);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Validation);
    }
}
