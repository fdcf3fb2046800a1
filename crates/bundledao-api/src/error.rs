//! Error types for the node API client.

use thiserror::Error;

/// Errors returned by the node API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The node answered 410: the account cannot pay for the bundle.
    #[error("Insufficient funds (410): {0}")]
    InsufficientFunds(String),

    /// Any other unsuccessful bundle submission.
    #[error("Failed to submit tx ({status}): {status_text}")]
    Submission { status: u16, status_text: String },

    /// A non-submission request returned an unexpected status.
    #[error("unexpected status ({status}): {status_text}")]
    UnexpectedStatus { status: u16, status_text: String },

    /// The auth token could not be obtained.
    #[error("auth token refresh failed: {0}")]
    AuthRefresh(String),

    /// The node still answered 401 after a token refresh.
    #[error("unauthorized after token refresh")]
    Unauthorized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
