//! Error types for the client.

use bundledao_api::ApiError;
use bundledao_core::CoreError;
use bundledao_identity::IdentityError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Signing or submission was attempted before `connect`.
    #[error("signer not configured: call connect() first")]
    SignerNotConfigured,

    /// Identity credentials were incomplete.
    #[error("missing identity credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// Encoding, signing, or bundling error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Identity service error.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Node API error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
