//! Startup errors

use wellspace_lib::error::AuthError;
use wellspace_lib::error::StoreError;

use crate::config::ConfigError;

/// Failures that stop the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open database: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid token configuration: {0}")]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
