//! Persistence error types

/// Errors returned by user and session stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("Database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// No record with the given id.
    #[error("{entity} not found")]
    NotFound {
        /// Record type, e.g. "Session".
        entity: &'static str,
    },

    /// The record exists but belongs to someone else.
    #[error("{entity} is owned by another user")]
    Forbidden {
        /// Record type, e.g. "session".
        entity: &'static str,
    },

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    Conflict(String),

    /// A stored row could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Creates a not-found error for a session.
    pub fn session_not_found() -> Self {
        Self::NotFound { entity: "Session" }
    }

    /// Creates an owner-mismatch error for a session.
    pub fn session_forbidden() -> Self {
        Self::Forbidden { entity: "session" }
    }
}
