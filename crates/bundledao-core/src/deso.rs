//! DeSo public key strings (base58Check over a network prefix and a
//! compressed secp256k1 key).

use base58::{FromBase58, ToBase58};
use std::fmt;
use std::str::FromStr;

use crate::crypto::{sha256, Secp256k1PublicKey, COMPRESSED_PUBLIC_KEY_LENGTH};
use crate::error::CoreError;

const PREFIX_LENGTH: usize = 3;
const CHECKSUM_LENGTH: usize = 4;
const DECODED_LENGTH: usize = PREFIX_LENGTH + COMPRESSED_PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH;

/// The DeSo network a public key string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// The base58Check version prefix.
    pub const fn prefix(self) -> [u8; PREFIX_LENGTH] {
        match self {
            Self::Mainnet => [0xcd, 0x14, 0x00],
            Self::Testnet => [0x11, 0xc2, 0x00],
        }
    }

    fn from_prefix(prefix: &[u8]) -> Option<Self> {
        [Self::Mainnet, Self::Testnet]
            .into_iter()
            .find(|n| n.prefix() == prefix)
    }
}

/// A public key as the DeSo identity service presents it.
#[derive(Clone, PartialEq, Eq)]
pub struct DesoPublicKey {
    network: Network,
    key: Secp256k1PublicKey,
}

impl DesoPublicKey {
    /// Wrap a public key for the given network.
    pub fn new(key: Secp256k1PublicKey, network: Network) -> Self {
        Self { network, key }
    }

    /// The network encoded in the prefix.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The underlying secp256k1 key.
    pub fn public_key(&self) -> &Secp256k1PublicKey {
        &self.key
    }
}

impl fmt::Display for DesoPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(DECODED_LENGTH);
        payload.extend_from_slice(&self.network.prefix());
        payload.extend_from_slice(&self.key.to_compressed());
        let checksum = sha256(&sha256(&payload));
        payload.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
        f.write_str(&payload.to_base58())
    }
}

impl fmt::Debug for DesoPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DesoPublicKey({})", self)
    }
}

impl FromStr for DesoPublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 5 {
            return Err(CoreError::InvalidDesoKey("too short".into()));
        }
        let decoded = s
            .from_base58()
            .map_err(|e| CoreError::InvalidDesoKey(format!("invalid base58: {e:?}")))?;
        if decoded.len() != DECODED_LENGTH {
            return Err(CoreError::InvalidDesoKey(format!(
                "expected {DECODED_LENGTH} decoded bytes, got {}",
                decoded.len()
            )));
        }

        let (payload, checksum) = decoded.split_at(DECODED_LENGTH - CHECKSUM_LENGTH);
        if sha256(&sha256(payload))[..CHECKSUM_LENGTH] != *checksum {
            return Err(CoreError::InvalidDesoKey("checksum mismatch".into()));
        }

        let (prefix, key_bytes) = payload.split_at(PREFIX_LENGTH);
        let network = Network::from_prefix(prefix)
            .ok_or_else(|| CoreError::InvalidDesoKey("unknown network prefix".into()))?;
        let key = Secp256k1PublicKey::from_sec1_bytes(key_bytes)
            .map_err(|e| CoreError::InvalidDesoKey(e.to_string()))?;

        Ok(Self { network, key })
    }
}
