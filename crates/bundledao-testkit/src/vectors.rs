//! Golden test vectors for deterministic verification.
//!
//! These pin the hash, key, and tag encodings so that any implementation
//! producing data items for the same network agrees byte for byte.

use bundledao_core::crypto::keccak256;
use bundledao_core::deep_hash::{deep_hash, DeepHashChunk};
use bundledao_core::tags::serialize_tags;
use bundledao_core::{personal_message_digest, DesoPublicKey, Network, Secp256k1Keypair, Tag};

/// A hash function applied to a fixed input.
#[derive(Debug, Clone)]
pub struct HashVector {
    pub name: &'static str,
    pub input: &'static [u8],
    /// Expected digest (hex).
    pub expected: &'static str,
}

/// A private key and the encodings of its public key.
#[derive(Debug, Clone)]
pub struct KeyVector {
    pub name: &'static str,
    pub seed: [u8; 32],
    /// SEC1 uncompressed public key (hex).
    pub uncompressed: &'static str,
    /// SEC1 compressed public key (hex).
    pub compressed: &'static str,
    pub deso_mainnet: &'static str,
    pub deso_testnet: &'static str,
}

/// A tag list and its binary encoding.
#[derive(Debug, Clone)]
pub struct TagVector {
    pub name: &'static str,
    pub tags: &'static [(&'static str, &'static str)],
    /// Expected encoding (hex).
    pub expected: &'static str,
}

/// Keccak-256 vectors.
pub fn keccak_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "keccak256 empty",
            input: b"",
            expected: "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
        },
        HashVector {
            name: "keccak256 abc",
            input: b"abc",
            expected: "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45",
        },
    ]
}

/// Signed-message digest vectors.
pub fn personal_digest_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "personal digest hello",
            input: b"hello",
            expected: "50b2c43fd39106bafbba0da34fc430e1f91e3c96ea2acee2bc34119f92b37750",
        },
        HashVector {
            name: "personal digest empty",
            input: b"",
            expected: "5f35dce98ba4fba25530a026ed80b2cecdaa31091ba4958b99b52ea1d068adad",
        },
    ]
}

/// Deep-hash vectors over single blobs.
pub fn deep_hash_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "deep hash empty blob",
            input: b"",
            expected: "fbf00cc444f5fea9dc3bedf62a13fba8ae87e7445fc910567a23bec4eb82fadb1143c433069314d8362983dc3c2e4a38",
        },
        HashVector {
            name: "deep hash hello",
            input: b"hello",
            expected: "33ab2407a6c328c0bc1bbe5971f49af5c1908985f83c3d2bd89a9e221dd8b068dc61ce968ba3f9ab12d5361ba3944382",
        },
    ]
}

/// Public key encoding vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "seed 0x42",
            seed: [0x42; 32],
            uncompressed: "0424653eac434488002cc06bbfb7f10fe18991e35f9fe4302dbea6d2353dc0ab1c119fc5009a032aa9fe47f5e149bb8442f71f884ccb516590686d8ff6ab91c613",
            compressed: "0324653eac434488002cc06bbfb7f10fe18991e35f9fe4302dbea6d2353dc0ab1c",
            deso_mainnet: "BC1YLhteKe5ASEjeFMC7nkvBnAtSfomQUcrzUsLfZLBVumdk8cmVzBJ",
            deso_testnet: "tBCKX1tLpM7rLeZzFmSEoWRaaCU48HBQhc4Qb1bJLZJxiYhZnvu3cn",
        },
        KeyVector {
            name: "seed 0x01",
            seed: [0x01; 32],
            uncompressed: "041b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f70beaf8f588b541507fed6a642c5ab42dfdf8120a7f639de5122d47a69a8e8d1",
            compressed: "031b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f",
            deso_mainnet: "BC1YLhpjaJJcMWnpATAzwMizbC3n4Myc9FRU4LfDxTBKT6x9YziDWt7",
            deso_testnet: "tBCKWwybUaZmchjuMkKPQKEPbMoSgVP5LAXz4L9hTZ8W3s6zANiJAv",
        },
    ]
}

/// Tag encoding vectors.
pub fn tag_vectors() -> Vec<TagVector> {
    vec![
        TagVector {
            name: "no tags",
            tags: &[],
            expected: "",
        },
        TagVector {
            name: "single short tag",
            tags: &[("a", "b")],
            expected: "020261026200",
        },
        TagVector {
            name: "content type",
            tags: &[("Content-Type", "text/plain")],
            expected: "0218436f6e74656e742d5479706514746578742f706c61696e00",
        },
        TagVector {
            name: "two tags",
            tags: &[("a", "b"), ("c", "d")],
            expected: "04026102620263026400",
        },
    ]
}

/// Check every vector, returning `(name, matches, actual)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();
    let mut check = |name: &str, expected: &str, actual: String| {
        results.push((name.to_string(), actual == expected, actual));
    };

    for v in keccak_vectors() {
        check(v.name, v.expected, hex::encode(keccak256(v.input)));
    }
    for v in personal_digest_vectors() {
        check(v.name, v.expected, hex::encode(personal_message_digest(v.input)));
    }
    for v in deep_hash_vectors() {
        check(v.name, v.expected, hex::encode(deep_hash(&DeepHashChunk::Blob(v.input))));
    }
    for v in key_vectors() {
        let key = Secp256k1Keypair::from_bytes(&v.seed).map(|kp| kp.public_key());
        match key {
            Ok(key) => {
                check(v.name, v.uncompressed, hex::encode(key.to_uncompressed()));
                check(v.name, v.compressed, hex::encode(key.to_compressed()));
                check(
                    v.name,
                    v.deso_mainnet,
                    DesoPublicKey::new(key.clone(), Network::Mainnet).to_string(),
                );
                check(
                    v.name,
                    v.deso_testnet,
                    DesoPublicKey::new(key, Network::Testnet).to_string(),
                );
            }
            Err(e) => check(v.name, v.compressed, e.to_string()),
        }
    }
    for v in tag_vectors() {
        let tags: Vec<Tag> = v.tags.iter().map(|(n, val)| Tag::new(*n, *val)).collect();
        let actual = serialize_tags(&tags)
            .map(hex::encode)
            .unwrap_or_else(|e| e.to_string());
        check(v.name, v.expected, actual);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "{name}: got {actual}");
        }
    }

    #[test]
    fn test_deso_strings_parse_back() {
        for v in key_vectors() {
            let parsed: DesoPublicKey = v.deso_mainnet.parse().unwrap();
            assert_eq!(parsed.network(), Network::Mainnet);
            assert_eq!(hex::encode(parsed.public_key().to_compressed()), v.compressed);

            let parsed: DesoPublicKey = v.deso_testnet.parse().unwrap();
            assert_eq!(parsed.network(), Network::Testnet);
        }
    }
}
