//! Error types for the identity service client.

use std::time::Duration;

use bundledao_core::{CoreError, SignerError};
use thiserror::Error;

/// Errors talking to the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity channel error: {0}")]
    Channel(String),

    #[error("identity service did not respond within {0:?}")]
    Timeout(Duration),

    #[error("identity service rejected the request: {0}")]
    Rejected(String),

    #[error("malformed identity response: {0}")]
    MalformedResponse(String),

    #[error("correlation id {0} is already pending")]
    DuplicateRequest(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<IdentityError> for SignerError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Timeout(d) => SignerError::Timeout(d),
            IdentityError::Rejected(msg) | IdentityError::MalformedResponse(msg) => {
                SignerError::Rejected(msg)
            }
            IdentityError::Channel(msg) | IdentityError::DuplicateRequest(msg) => {
                SignerError::Channel(msg)
            }
            IdentityError::Serialization(e) => SignerError::Channel(e.to_string()),
            IdentityError::Core(e) => SignerError::Encoding(e.to_string()),
        }
    }
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
