//! Token and password error types

/// Errors from token signing/verification and password hashing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No signing secret was configured.
    #[error("Token secret is not configured")]
    MissingSecret,

    /// The token is not three base64url segments of valid JSON.
    #[error("Malformed token")]
    MalformedToken,

    /// The token header names an algorithm other than HS256.
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not match the token body.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token is past its expiry time.
    #[error("Token expired")]
    Expired,

    /// The subject claim is not a valid user id.
    #[error("Invalid token subject: {0}")]
    InvalidSubject(String),

    /// Password hashing or hash parsing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
