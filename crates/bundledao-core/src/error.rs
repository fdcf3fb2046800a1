//! Error types for the BundleDAO core.

use std::time::Duration;

use thiserror::Error;

/// Core errors that can occur while encoding, signing, or bundling.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid DeSo public key: {0}")]
    InvalidDesoKey(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("unsupported signature type: {0}")]
    UnsupportedSignatureType(u16),

    #[error("malformed data item: {0}")]
    MalformedDataItem(String),

    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    #[error("data item at index {index} is not signed")]
    UnsignedItem { index: usize },

    #[error("data item is already signed")]
    AlreadySigned,

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),
}

/// Errors raised by a [`Signer`](crate::signer::Signer) implementation.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The signer (or the service behind it) returned no usable signature.
    #[error("signature rejected: {0}")]
    Rejected(String),

    /// A remote signer never answered.
    #[error("signer did not respond within {0:?}")]
    Timeout(Duration),

    /// The channel to a remote signer failed.
    #[error("signer channel error: {0}")]
    Channel(String),

    /// Signature components could not be encoded.
    #[error("signature encoding error: {0}")]
    Encoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
