//! The signer capability and its local (in-process key) implementation.
//!
//! Every signer hashes messages through [`personal_message_digest`] before
//! signing, so signatures from any implementation verify with
//! [`verify_message`].

use async_trait::async_trait;
use std::fmt;

use crate::crypto::{
    personal_message_digest, Secp256k1Keypair, Secp256k1PublicKey, UNCOMPRESSED_PUBLIC_KEY_LENGTH,
};
use crate::error::{Result, SignerError};
use crate::signature::{self, SIGNATURE_LENGTH};

/// Signature schemes understood by the storage network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SignatureType {
    /// secp256k1 ECDSA over the personal-message digest.
    Ethereum = 3,
}

impl SignatureType {
    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            3 => Some(Self::Ethereum),
            _ => None,
        }
    }

    /// Length of a signature of this type.
    pub fn signature_length(self) -> usize {
        match self {
            Self::Ethereum => SIGNATURE_LENGTH,
        }
    }

    /// Length of an owner (public key) of this type.
    pub fn owner_length(self) -> usize {
        match self {
            Self::Ethereum => UNCOMPRESSED_PUBLIC_KEY_LENGTH,
        }
    }
}

/// A signing capability: a public key plus an async `sign`.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The signature scheme this signer produces.
    fn signature_type(&self) -> SignatureType {
        SignatureType::Ethereum
    }

    /// Length of [`Signer::public_key`].
    fn owner_length(&self) -> usize {
        self.signature_type().owner_length()
    }

    /// Length of the bytes returned by [`Signer::sign`].
    fn signature_length(&self) -> usize {
        self.signature_type().signature_length()
    }

    /// The owner bytes embedded in data items (uncompressed public key).
    fn public_key(&self) -> &[u8];

    /// Sign a message, returning exactly `signature_length()` bytes.
    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError>;
}

/// Verify a signature over `message` (digest applied here).
pub fn verify_message(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    signature::verify(public_key, &personal_message_digest(message), signature)
}

/// A signer holding the private key in memory.
pub struct LocalSigner {
    keypair: Secp256k1Keypair,
    owner: [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH],
}

impl LocalSigner {
    /// Create a signer for the given keypair.
    pub fn new(keypair: Secp256k1Keypair) -> Self {
        let owner = keypair.public_key().to_uncompressed();
        Self { keypair, owner }
    }

    /// Create a signer from a hex-encoded private key.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        Ok(Self::new(Secp256k1Keypair::from_hex(seed_hex)?))
    }

    /// Create a signer with a freshly generated key.
    pub fn generate() -> Self {
        Self::new(Secp256k1Keypair::generate())
    }

    /// The signer's public key.
    pub fn secp256k1_public_key(&self) -> Secp256k1PublicKey {
        self.keypair.public_key()
    }

    /// The underlying keypair.
    pub fn keypair(&self) -> &Secp256k1Keypair {
        &self.keypair
    }

    /// Sign without going through the async interface.
    pub fn sign_blocking(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
        let digest = personal_message_digest(message);
        let parts = self
            .keypair
            .sign_digest(&digest)
            .map_err(|e| SignerError::Encoding(e.to_string()))?;
        Ok(parts.to_vec())
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn public_key(&self) -> &[u8] {
        &self.owner
    }

    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
        self.sign_blocking(message)
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalSigner({:?})", self.keypair.public_key())
    }
}
