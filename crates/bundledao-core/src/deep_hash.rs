//! SHA-384 deep hash over nested byte strings.
//!
//! A blob hashes as `sha384(sha384("blob" || len) || sha384(data))`. A list
//! starts from `sha384("list" || len)` and folds each element in as
//! `acc = sha384(acc || deep_hash(element))`. Lengths are decimal ASCII.

use sha2::{Digest, Sha384};

use crate::crypto::sha384;

/// Length of a deep hash.
pub const DEEP_HASH_LENGTH: usize = 48;

/// A node in the structure being hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepHashChunk<'a> {
    Blob(&'a [u8]),
    List(Vec<DeepHashChunk<'a>>),
}

impl<'a> From<&'a [u8]> for DeepHashChunk<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Blob(bytes)
    }
}

/// Compute the deep hash of a chunk.
pub fn deep_hash(chunk: &DeepHashChunk<'_>) -> [u8; DEEP_HASH_LENGTH] {
    match chunk {
        DeepHashChunk::Blob(data) => {
            let tag = sha384(format!("blob{}", data.len()).as_bytes());
            concat_hash(&tag, &sha384(data))
        }
        DeepHashChunk::List(items) => {
            let mut acc = sha384(format!("list{}", items.len()).as_bytes());
            for item in items {
                acc = concat_hash(&acc, &deep_hash(item));
            }
            acc
        }
    }
}

fn concat_hash(a: &[u8], b: &[u8]) -> [u8; DEEP_HASH_LENGTH] {
    let mut hasher = Sha384::new();
    hasher.update(a);
    hasher.update(b);
    let mut out = [0u8; DEEP_HASH_LENGTH];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_blob_vector() {
        assert_eq!(
            hex::encode(deep_hash(&DeepHashChunk::Blob(b""))),
            "fbf00cc444f5fea9dc3bedf62a13fba8ae87e7445fc910567a23bec4eb82fadb1143c433069314d8362983dc3c2e4a38"
        );
    }

    #[test]
    fn test_blob_vector() {
        assert_eq!(
            hex::encode(deep_hash(&DeepHashChunk::Blob(b"hello"))),
            "33ab2407a6c328c0bc1bbe5971f49af5c1908985f83c3d2bd89a9e221dd8b068dc61ce968ba3f9ab12d5361ba3944382"
        );
    }

    #[test]
    fn test_empty_list_vector() {
        assert_eq!(
            hex::encode(deep_hash(&DeepHashChunk::List(vec![]))),
            "a69e7d37fdc7f040a9ec16aae84de24fab4a653dac4de0bd247e36bab9fe45d9289c5a04a893c95285812f5cefc9707a"
        );
    }

    #[test]
    fn test_nested_list_vector() {
        let chunk = DeepHashChunk::List(vec![
            DeepHashChunk::Blob(b"a"),
            DeepHashChunk::List(vec![DeepHashChunk::Blob(b"b"), DeepHashChunk::Blob(b"c")]),
        ]);
        assert_eq!(
            hex::encode(deep_hash(&chunk)),
            "30bce0a753c170f214f57dd0244bc29c76526aea405cd8bff8af8301a7d10424e1c57f63ab4d55070b99f48f72a8c2e7"
        );
    }

    #[test]
    fn test_structure_matters() {
        let flat = DeepHashChunk::List(vec![DeepHashChunk::Blob(b"ab")]);
        let split = DeepHashChunk::List(vec![DeepHashChunk::Blob(b"a"), DeepHashChunk::Blob(b"b")]);
        assert_ne!(deep_hash(&flat), deep_hash(&split));
        assert_ne!(deep_hash(&flat), deep_hash(&DeepHashChunk::Blob(b"ab")));
    }
}
