//! Cryptographic primitives for the BundleDAO SDK.
//!
//! Wraps secp256k1 keys and the hash functions used by the storage network
//! with strong types.

use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256, Sha384};
use sha3::Keccak256;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::signature::{SignatureParts, ETHEREUM_V_OFFSET};

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBLIC_KEY_LENGTH: usize = 33;

/// Length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;

/// Length of a secp256k1 private key.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Prefix of the chain's personal-message digest.
const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// SHA-256 of the given data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-384 of the given data.
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut out = [0u8; 48];
    out.copy_from_slice(&Sha384::digest(data));
    out
}

/// Keccak-256 of the given data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Domain-separated digest of a message prior to signing.
///
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`,
/// with the length written in decimal.
pub fn personal_message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// A secp256k1 public key.
///
/// Accepts both compressed (33-byte) and uncompressed (65-byte) encodings.
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey(VerifyingKey);

impl Secp256k1PublicKey {
    /// Parse from a SEC1 encoding (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_LENGTH
            && bytes.len() != UNCOMPRESSED_PUBLIC_KEY_LENGTH
        {
            return Err(CoreError::InvalidPublicKey(format!(
                "expected 33 or 65 bytes, got {}",
                bytes.len()
            )));
        }
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CoreError::InvalidPublicKey("not a point on secp256k1".into()))
    }

    /// Parse from a hex string of a SEC1 encoding.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;
        Self::from_sec1_bytes(&bytes)
    }

    /// The 33-byte compressed encoding.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_LENGTH] {
        let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(self.0.to_encoded_point(true).as_bytes());
        out
    }

    /// The 65-byte uncompressed encoding (`0x04 || x || y`).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH] {
        let mut out = [0u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(self.0.to_encoded_point(false).as_bytes());
        out
    }

    /// Convert the compressed encoding to hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    pub(crate) fn from_verifying_key(key: VerifyingKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Pub({})", &self.to_hex()[..16])
    }
}

/// A secp256k1 keypair.
///
/// The private scalar never leaves this type: it is not serializable and
/// `Debug` prints only the public key.
#[derive(Clone)]
pub struct Secp256k1Keypair {
    signing_key: SigningKey,
}

impl Secp256k1Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Create from a 32-byte private key.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LENGTH]) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CoreError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Create from a hex-encoded 32-byte private key ("seed hex").
    pub fn from_hex(seed_hex: &str) -> Result<Self> {
        let bytes = hex::decode(seed_hex.trim().trim_start_matches("0x"))
            .map_err(|_| CoreError::InvalidPrivateKey)?;
        let arr: [u8; PRIVATE_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidPrivateKey)?;
        Self::from_bytes(&arr)
    }

    /// Get the public key.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(VerifyingKey::from(&self.signing_key))
    }

    /// Sign a 32-byte digest, enforcing a low-S signature.
    ///
    /// The returned parts carry `v = 27 + recovery id`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<SignatureParts> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;

        // Negating s flips the parity of the recovered point.
        let (signature, recovery_id) = match signature.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        };

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(SignatureParts {
            r,
            s,
            v: Some(ETHEREUM_V_OFFSET + recovery_id.to_byte()),
        })
    }

    /// Sign raw bytes with ECDSA over SHA-256 (used for JWTs).
    pub fn sign_sha256(&self, message: &[u8]) -> Result<[u8; 64]> {
        let parts = self.sign_digest(&sha256(message))?;
        Ok(parts.to_compact())
    }
}

impl fmt::Debug for Secp256k1Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Keypair({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_personal_message_digest() {
        assert_eq!(
            hex::encode(personal_message_digest(b"hello world")),
            "d9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
        );
    }

    #[test]
    fn test_public_key_from_private_key_one() {
        let mut seed = [0u8; 32];
        seed[31] = 1;
        let keypair = Secp256k1Keypair::from_bytes(&seed).unwrap();
        assert_eq!(
            hex::encode(keypair.public_key().to_compressed()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_compressed_and_uncompressed_agree() {
        let keypair = Secp256k1Keypair::from_bytes(&[0x42; 32]).unwrap();
        let pk = keypair.public_key();

        let from_compressed = Secp256k1PublicKey::from_sec1_bytes(&pk.to_compressed()).unwrap();
        let from_uncompressed =
            Secp256k1PublicKey::from_sec1_bytes(&pk.to_uncompressed()).unwrap();
        assert_eq!(from_compressed, from_uncompressed);
        assert_eq!(pk.to_uncompressed()[0], 0x04);
    }

    #[test]
    fn test_rejects_bad_public_key_lengths() {
        assert!(Secp256k1PublicKey::from_sec1_bytes(&[0x02; 32]).is_err());
        assert!(Secp256k1PublicKey::from_sec1_bytes(&[0x04; 64]).is_err());
    }

    #[test]
    fn test_rejects_zero_private_key() {
        assert!(Secp256k1Keypair::from_bytes(&[0u8; 32]).is_err());
        assert!(Secp256k1Keypair::from_hex("not hex").is_err());
        assert!(Secp256k1Keypair::from_hex("abcd").is_err());
    }

    #[test]
    fn test_signatures_are_low_s() {
        // Half the curve order, big-endian.
        const HALF_ORDER: [u8; 32] = [
            0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46,
            0x68, 0x1b, 0x20, 0xa0,
        ];
        let keypair = Secp256k1Keypair::generate();
        for i in 0..32u8 {
            let parts = keypair.sign_digest(&sha256(&[i])).unwrap();
            assert!(parts.s <= HALF_ORDER);
            assert!(matches!(parts.v, Some(27) | Some(28)));
        }
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let keypair = Secp256k1Keypair::from_bytes(&[0x42; 32]).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(debug.starts_with("Secp256k1Keypair("));
        assert!(!debug.contains("4242424242"));
    }
}
