//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator at the application edges.

use thiserror::Error;

/// Errors raised while building a [`crate::domain::endpoint::ServerEndpoint`].
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid hostname or IP address: {0:?}")]
    InvalidHost(String),

    #[error("invalid SSH port (must be 1-65535): {0:?}")]
    InvalidPort(String),

    #[error("SSH key file not found: {0}")]
    KeyFileNotFound(String),

    #[error("no authentication method: provide a private key path or a password")]
    MissingAuth,
}

/// Errors raised while extracting database credentials from wp-config.php.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("could not extract {0} from wp-config.php")]
    MissingDirective(&'static str),
}
