//! Signature codec: fixed-length `r || s || v` encoding of ECDSA signatures.
//!
//! The serialized form is 65 bytes: 32 bytes `r`, 32 bytes `s`, one byte
//! `v`, each big-endian and left-padded with zeros. The 64-byte form (no `v`)
//! is accepted on decode and verify for peers that omit the recovery byte.
//!
//! Verification is a predicate: malformed keys, digests, or signatures
//! yield `false`, never an error.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::crypto::Secp256k1PublicKey;
use crate::error::{CoreError, Result};

/// Length of the serialized signature (`r || s || v`).
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of the compact signature (`r || s`).
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Offset added to the recovery id in the `v` byte (Ethereum convention).
pub const ETHEREUM_V_OFFSET: u8 = 27;

const SCALAR_LENGTH: usize = 32;

/// The decoded components of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    /// Big-endian `r`.
    pub r: [u8; 32],
    /// Big-endian `s`.
    pub s: [u8; 32],
    /// The `v` byte, absent for 64-byte signatures.
    pub v: Option<u8>,
}

impl SignatureParts {
    /// The 64-byte `r || s` form.
    pub fn to_compact(&self) -> [u8; COMPACT_SIGNATURE_LENGTH] {
        let mut out = [0u8; COMPACT_SIGNATURE_LENGTH];
        out[..SCALAR_LENGTH].copy_from_slice(&self.r);
        out[SCALAR_LENGTH..].copy_from_slice(&self.s);
        out
    }

    /// The serialized form: 65 bytes when `v` is known, 64 otherwise.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = self.to_compact().to_vec();
        if let Some(v) = self.v {
            out.push(v);
        }
        out
    }

    /// The recovery id carried by `v`, accepting both `0/1` and `27/28`.
    pub fn recovery_id(&self) -> Option<u8> {
        match self.v? {
            v @ 0..=1 => Some(v),
            v @ 27..=28 => Some(v - ETHEREUM_V_OFFSET),
            _ => None,
        }
    }
}

/// Encode `r`, `s`, and `v` into the 65-byte form.
///
/// `r` and `s` are big-endian unsigned integers of at most 32 significant
/// bytes; shorter values are left-padded.
pub fn encode(r: &[u8], s: &[u8], v: u8) -> Result<[u8; SIGNATURE_LENGTH]> {
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..SCALAR_LENGTH].copy_from_slice(&left_pad(r, "r")?);
    out[SCALAR_LENGTH..COMPACT_SIGNATURE_LENGTH].copy_from_slice(&left_pad(s, "s")?);
    out[COMPACT_SIGNATURE_LENGTH] = v;
    Ok(out)
}

/// Decode a 64- or 65-byte signature into its components.
pub fn decode(bytes: &[u8]) -> Result<SignatureParts> {
    let v = match bytes.len() {
        SIGNATURE_LENGTH => Some(bytes[COMPACT_SIGNATURE_LENGTH]),
        COMPACT_SIGNATURE_LENGTH => None,
        n => {
            return Err(CoreError::Encoding(format!(
                "signature must be 64 or 65 bytes, got {n}"
            )))
        }
    };

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..SCALAR_LENGTH]);
    s.copy_from_slice(&bytes[SCALAR_LENGTH..COMPACT_SIGNATURE_LENGTH]);
    Ok(SignatureParts { r, s, v })
}

/// Decode a hex scalar as sent by the identity service (`0x` optional,
/// odd length allowed).
pub fn scalar_from_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s.trim().trim_start_matches("0x");
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    hex::decode(padded).map_err(|e| CoreError::Encoding(format!("invalid hex scalar: {e}")))
}

/// Verify a signature over a 32-byte digest.
///
/// `public_key` may be compressed or uncompressed. Returns `false` for any
/// malformed input, high-S signature, or mismatch.
pub fn verify(public_key: &[u8], digest: &[u8], signature: &[u8]) -> bool {
    if digest.len() != 32 {
        return false;
    }
    let Ok(key) = Secp256k1PublicKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(parts) = decode(signature) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(&parts.to_compact()) else {
        return false;
    };
    key.verifying_key().verify_prehash(digest, &sig).is_ok()
}

/// Recover the signer's public key from a 65-byte signature over a digest.
pub fn recover(digest: &[u8; 32], signature: &[u8]) -> Result<Secp256k1PublicKey> {
    let parts = decode(signature)?;
    let recovery_id = parts
        .recovery_id()
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| CoreError::Encoding("missing or invalid recovery id".into()))?;
    let sig = Signature::from_slice(&parts.to_compact())
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map(Secp256k1PublicKey::from_verifying_key)
        .map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Strip leading zeros and left-pad to exactly 32 bytes.
fn left_pad(bytes: &[u8], name: &str) -> Result<[u8; SCALAR_LENGTH]> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first..];
    if significant.len() > SCALAR_LENGTH {
        return Err(CoreError::Encoding(format!(
            "{name} overflows 32 bytes ({} significant bytes)",
            significant.len()
        )));
    }
    let mut out = [0u8; SCALAR_LENGTH];
    out[SCALAR_LENGTH - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{personal_message_digest, Secp256k1Keypair};

    #[test]
    fn test_encode_pads_short_scalars() {
        let encoded = encode(&[0x01], &[0x02, 0x03], 27).unwrap();
        assert_eq!(encoded[31], 0x01);
        assert!(encoded[..31].iter().all(|b| *b == 0));
        assert_eq!(&encoded[62..64], &[0x02, 0x03]);
        assert_eq!(encoded[64], 27);
    }

    #[test]
    fn test_encode_accepts_leading_zero_overhang() {
        let mut r = vec![0u8; 33];
        r[32] = 0xff;
        let encoded = encode(&r, &[0x01], 0).unwrap();
        assert_eq!(encoded[31], 0xff);
    }

    #[test]
    fn test_encode_rejects_overflow() {
        let r = [0xffu8; 33];
        assert!(matches!(
            encode(&r, &[0x01], 27),
            Err(CoreError::Encoding(_))
        ));
        assert!(matches!(
            encode(&[0x01], &r, 27),
            Err(CoreError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_lengths() {
        let full = decode(&[0x11; 65]).unwrap();
        assert_eq!(full.v, Some(0x11));

        let compact = decode(&[0x11; 64]).unwrap();
        assert_eq!(compact.v, None);
        assert_eq!(compact.recovery_id(), None);

        assert!(decode(&[0x11; 63]).is_err());
        assert!(decode(&[0x11; 66]).is_err());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let keypair = Secp256k1Keypair::generate();
        let parts = keypair.sign_digest(&personal_message_digest(b"roundtrip")).unwrap();
        let encoded = encode(&parts.r, &parts.s, parts.v.unwrap()).unwrap();

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, parts);
        let reencoded = encode(&decoded.r, &decoded.s, decoded.v.unwrap()).unwrap();
        assert_eq!(reencoded, encoded);
    }

    #[test]
    fn test_recovery_id_normalization() {
        let mut parts = decode(&[0x01; 65]).unwrap();
        parts.v = Some(28);
        assert_eq!(parts.recovery_id(), Some(1));
        parts.v = Some(0);
        assert_eq!(parts.recovery_id(), Some(0));
        parts.v = Some(35);
        assert_eq!(parts.recovery_id(), None);
    }

    #[test]
    fn test_verify_valid_and_compact() {
        let keypair = Secp256k1Keypair::generate();
        let digest = personal_message_digest(b"hello");
        let parts = keypair.sign_digest(&digest).unwrap();
        let pk = keypair.public_key();

        assert!(verify(&pk.to_uncompressed(), &digest, &parts.to_vec()));
        assert!(verify(&pk.to_compressed(), &digest, &parts.to_compact()));
    }

    #[test]
    fn test_verify_fails_closed() {
        let keypair = Secp256k1Keypair::generate();
        let digest = personal_message_digest(b"hello");
        let sig = keypair.sign_digest(&digest).unwrap().to_vec();
        let pk = keypair.public_key().to_uncompressed();

        let mut tampered = digest;
        tampered[0] ^= 0x01;
        assert!(!verify(&pk, &tampered, &sig));

        assert!(!verify(&pk, &digest[..31], &sig));
        assert!(!verify(&pk[..64], &digest, &sig));
        assert!(!verify(&[0u8; 65], &digest, &sig));
        assert!(!verify(&pk, &digest, &sig[..10]));
        assert!(!verify(&pk, &digest, &[0u8; 65]));
        assert!(!verify(&pk, &digest, &[0xff; 64]));
    }

    #[test]
    fn test_recover_matches_signer() {
        let keypair = Secp256k1Keypair::generate();
        let digest = personal_message_digest(b"recover me");
        let sig = keypair.sign_digest(&digest).unwrap().to_vec();

        let recovered = recover(&digest, &sig).unwrap();
        assert_eq!(recovered, keypair.public_key());
        assert!(recover(&digest, &sig[..64]).is_err());
    }

    #[test]
    fn test_scalar_from_hex() {
        assert_eq!(scalar_from_hex("0x1").unwrap(), vec![0x01]);
        assert_eq!(scalar_from_hex("abc").unwrap(), vec![0x0a, 0xbc]);
        assert!(scalar_from_hex("0xzz").is_err());
    }
}
