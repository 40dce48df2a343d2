//! Error types for gallery-core

use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using gallery-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gallery-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Sign-in rejected, session missing, or auth backend failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A required field is missing or blank
    #[error("{0}")]
    Validation(String),

    /// Artwork id is unknown to the backend
    #[error("Artwork not found: {0}")]
    NotFound(String),

    /// Object storage rejected an upload
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Object storage failed to release a stored image
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Backend call did not complete within the configured deadline
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Backend answered with a non-success status
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the record no longer exists on the backend.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}
