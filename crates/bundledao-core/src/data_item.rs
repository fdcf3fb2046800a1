//! Signed, content-addressed data items.
//!
//! A [`DataItem`] is created unsigned by a [`DataItemBuilder`] and moves to
//! the signed state exactly once through [`DataItem::sign`]. A failed sign
//! leaves the item untouched.

use bytes::Bytes;

use crate::deep_hash::{deep_hash, DeepHashChunk, DEEP_HASH_LENGTH};
use crate::error::{CoreError, Result, SignerError};
use crate::signer::{verify_message, SignatureType, Signer};
use crate::tags::{deserialize_tags, serialize_tags, validate_tags, Tag};
use crate::types::DataItemId;

/// Value of the provenance `App-Name` tag.
pub const APP_NAME: &str = "BundleDAO";

/// Value of the provenance `App-Version` tag.
pub const APP_VERSION: &str = "0.1.0";

/// Length of the optional target and anchor fields.
pub const TARGET_LENGTH: usize = 32;

/// Length of the optional anchor field.
pub const ANCHOR_LENGTH: usize = 32;

/// A data item: payload, tags, owner, and signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    signature_type: SignatureType,
    signature: Vec<u8>,
    owner: Vec<u8>,
    target: Option<[u8; TARGET_LENGTH]>,
    anchor: Option<[u8; ANCHOR_LENGTH]>,
    tags: Vec<Tag>,
    raw_tags: Bytes,
    data: Bytes,
}

impl DataItem {
    /// The signature scheme.
    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// The signature bytes (all zero while unsigned).
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The owner public key.
    pub fn owner(&self) -> &[u8] {
        &self.owner
    }

    /// The optional target.
    pub fn target(&self) -> Option<&[u8; TARGET_LENGTH]> {
        self.target.as_ref()
    }

    /// The optional anchor.
    pub fn anchor(&self) -> Option<&[u8; ANCHOR_LENGTH]> {
        self.anchor.as_ref()
    }

    /// The tags, in order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The encoded tag bytes.
    pub fn raw_tags(&self) -> &[u8] {
        &self.raw_tags
    }

    /// The payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The bytes a signer signs: the deep hash of the item's fields.
    pub fn signature_data(&self) -> [u8; DEEP_HASH_LENGTH] {
        let signature_type = self.signature_type.to_u16().to_string();
        let target = self.target.as_ref().map_or(&[][..], |t| &t[..]);
        let anchor = self.anchor.as_ref().map_or(&[][..], |a| &a[..]);

        deep_hash(&DeepHashChunk::List(vec![
            DeepHashChunk::Blob(b"dataitem"),
            DeepHashChunk::Blob(b"1"),
            DeepHashChunk::Blob(signature_type.as_bytes()),
            DeepHashChunk::Blob(&self.owner),
            DeepHashChunk::Blob(target),
            DeepHashChunk::Blob(anchor),
            DeepHashChunk::Blob(&self.raw_tags),
            DeepHashChunk::Blob(&self.data),
        ]))
    }

    /// Whether a non-empty signature is present.
    pub fn is_signed(&self) -> bool {
        self.signature.iter().any(|b| *b != 0)
    }

    /// Whether the signature verifies against the owner and signature data.
    pub fn is_valid(&self) -> bool {
        self.is_signed()
            && self.signature.len() == self.signature_type.signature_length()
            && self.owner.len() == self.signature_type.owner_length()
            && verify_message(&self.owner, &self.signature_data(), &self.signature)
    }

    /// The content id: SHA-256 of the signature.
    ///
    /// Only meaningful once the item is signed.
    pub fn id(&self) -> DataItemId {
        DataItemId::from_signature(&self.signature)
    }

    /// Sign the item, returning its id.
    ///
    /// The item is only modified if the signer succeeds with a signature of
    /// the declared length.
    pub async fn sign(&mut self, signer: &dyn Signer) -> Result<DataItemId> {
        if self.is_signed() {
            return Err(CoreError::AlreadySigned);
        }
        if signer.signature_type() != self.signature_type {
            return Err(CoreError::UnsupportedSignatureType(
                signer.signature_type().to_u16(),
            ));
        }
        if signer.public_key() != self.owner.as_slice() {
            return Err(SignerError::Rejected("signer does not own this item".into()).into());
        }

        let signature = signer.sign(&self.signature_data()).await?;
        if signature.len() != self.signature_type.signature_length() {
            return Err(SignerError::Rejected(format!(
                "expected {} signature bytes, got {}",
                self.signature_type.signature_length(),
                signature.len()
            ))
            .into());
        }

        self.signature = signature;
        Ok(self.id())
    }

    /// Length of the serialized item.
    pub fn len(&self) -> usize {
        2 + self.signature.len()
            + self.owner.len()
            + 1
            + self.target.map_or(0, |_| TARGET_LENGTH)
            + 1
            + self.anchor.map_or(0, |_| ANCHOR_LENGTH)
            + 16
            + self.raw_tags.len()
            + self.data.len()
    }

    /// Whether the serialized item is empty (never true).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to the binary data item format.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.len());
        buf.extend_from_slice(&self.signature_type.to_u16().to_le_bytes());
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.owner);
        write_optional(&mut buf, self.target.as_ref().map(|t| &t[..]));
        write_optional(&mut buf, self.anchor.as_ref().map(|a| &a[..]));
        buf.extend_from_slice(&(self.tags.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(self.raw_tags.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.raw_tags);
        buf.extend_from_slice(&self.data);
        Bytes::from(buf)
    }

    /// Parse the binary data item format.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let mut cursor = Cursor { bytes: raw, pos: 0 };

        let type_bytes: [u8; 2] = cursor.take_array()?;
        let type_value = u16::from_le_bytes(type_bytes);
        let signature_type = SignatureType::from_u16(type_value)
            .ok_or(CoreError::UnsupportedSignatureType(type_value))?;

        let signature = cursor.take(signature_type.signature_length())?.to_vec();
        let owner = cursor.take(signature_type.owner_length())?.to_vec();
        let target = cursor.take_optional::<TARGET_LENGTH>()?;
        let anchor = cursor.take_optional::<ANCHOR_LENGTH>()?;

        let tag_count = u64::from_le_bytes(cursor.take_array()?);
        let tag_bytes_len = u64::from_le_bytes(cursor.take_array()?);
        let tag_bytes_len = usize::try_from(tag_bytes_len)
            .map_err(|_| CoreError::MalformedDataItem("tag length overflows".into()))?;
        let raw_tags = cursor.take(tag_bytes_len)?;

        let tags = deserialize_tags(raw_tags)?;
        if tags.len() as u64 != tag_count {
            return Err(CoreError::MalformedDataItem(format!(
                "header declares {tag_count} tags, found {}",
                tags.len()
            )));
        }
        validate_tags(&tags)?;

        Ok(Self {
            signature_type,
            signature,
            owner,
            target,
            anchor,
            tags,
            raw_tags: Bytes::copy_from_slice(raw_tags),
            data: Bytes::copy_from_slice(cursor.rest()),
        })
    }
}

/// Builder for creating data items.
#[derive(Debug, Clone)]
pub struct DataItemBuilder {
    data: Bytes,
    tags: Vec<Tag>,
    target: Option<[u8; TARGET_LENGTH]>,
    anchor: Option<[u8; ANCHOR_LENGTH]>,
}

impl DataItemBuilder {
    /// Start building an item around a payload.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            tags: Vec::new(),
            target: None,
            anchor: None,
        }
    }

    /// Append a tag.
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name, value));
        self
    }

    /// Append several tags, preserving their order.
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set the target.
    pub fn target(mut self, target: [u8; TARGET_LENGTH]) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the anchor.
    pub fn anchor(mut self, anchor: [u8; ANCHOR_LENGTH]) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Build an unsigned item for the given owner.
    pub fn build_unsigned(self, signature_type: SignatureType, owner: &[u8]) -> Result<DataItem> {
        if owner.len() != signature_type.owner_length() {
            return Err(CoreError::InvalidPublicKey(format!(
                "owner must be {} bytes, got {}",
                signature_type.owner_length(),
                owner.len()
            )));
        }
        let raw_tags = serialize_tags(&self.tags)?;

        Ok(DataItem {
            signature_type,
            signature: vec![0u8; signature_type.signature_length()],
            owner: owner.to_vec(),
            target: self.target,
            anchor: self.anchor,
            tags: self.tags,
            raw_tags: Bytes::from(raw_tags),
            data: self.data,
        })
    }

    /// Build and sign the item.
    pub async fn sign(self, signer: &dyn Signer) -> Result<DataItem> {
        let mut item = self.build_unsigned(signer.signature_type(), signer.public_key())?;
        item.sign(signer).await?;
        Ok(item)
    }
}

/// Create a signed data item, appending the `App-Name` and `App-Version`
/// provenance tags after the caller's tags.
pub async fn create_data_item(
    payload: impl AsRef<[u8]>,
    signer: &dyn Signer,
    tags: &[Tag],
) -> Result<DataItem> {
    DataItemBuilder::new(Bytes::copy_from_slice(payload.as_ref()))
        .tags(tags.iter().cloned())
        .tag("App-Name", APP_NAME)
        .tag("App-Version", APP_VERSION)
        .sign(signer)
        .await
}

fn write_optional(buf: &mut Vec<u8>, field: Option<&[u8]>) {
    match field {
        Some(bytes) => {
            buf.push(1);
            buf.extend_from_slice(bytes);
        }
        None => buf.push(0),
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                CoreError::MalformedDataItem(format!(
                    "truncated: need {n} bytes at offset {}, have {}",
                    self.pos,
                    self.bytes.len() - self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn take_optional<const N: usize>(&mut self) -> Result<Option<[u8; N]>> {
        match self.take(1)?[0] {
            0 => Ok(None),
            1 => Ok(Some(self.take_array()?)),
            flag => Err(CoreError::MalformedDataItem(format!(
                "invalid presence flag {flag} at offset {}",
                self.pos - 1
            ))),
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::LocalSigner;
    use async_trait::async_trait;

    fn fixed_signer() -> LocalSigner {
        LocalSigner::from_seed_hex(&"42".repeat(32)).unwrap()
    }

    struct FailingSigner {
        owner: Vec<u8>,
        signature: Option<Vec<u8>>,
    }

    #[async_trait]
    impl Signer for FailingSigner {
        fn public_key(&self) -> &[u8] {
            &self.owner
        }

        async fn sign(&self, _message: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
            self.signature
                .clone()
                .ok_or_else(|| SignerError::Rejected("no signature".into()))
        }
    }

    #[tokio::test]
    async fn test_create_signed_item() {
        let signer = fixed_signer();
        let item = create_data_item("test string", &signer, &[]).await.unwrap();

        assert!(item.is_signed());
        assert!(item.is_valid());
        assert_eq!(item.data().as_ref(), b"test string");
        assert_eq!(item.owner(), signer.public_key());
        assert_eq!(item.id(), DataItemId::from_signature(item.signature()));
    }

    #[tokio::test]
    async fn test_provenance_tags_appended_last() {
        let signer = fixed_signer();
        let tags = vec![Tag::new("Content-Type", "text/plain"), Tag::new("b", "c")];
        let item = create_data_item(b"x", &signer, &tags).await.unwrap();

        assert_eq!(
            item.tags(),
            &[
                Tag::new("Content-Type", "text/plain"),
                Tag::new("b", "c"),
                Tag::new("App-Name", APP_NAME),
                Tag::new("App-Version", APP_VERSION),
            ]
        );
    }

    #[test]
    fn test_unsigned_item() {
        let signer = fixed_signer();
        let item = DataItemBuilder::new(&b"payload"[..])
            .build_unsigned(SignatureType::Ethereum, signer.public_key())
            .unwrap();

        assert!(!item.is_signed());
        assert!(!item.is_valid());
        assert_eq!(item.signature(), &[0u8; 65][..]);
    }

    #[test]
    fn test_build_rejects_bad_owner() {
        let result = DataItemBuilder::new(&b"payload"[..]).build_unsigned(SignatureType::Ethereum, &[4u8; 33]);
        assert!(matches!(result, Err(CoreError::InvalidPublicKey(_))));
    }

    #[tokio::test]
    async fn test_sign_twice_fails() {
        let signer = fixed_signer();
        let mut item = DataItemBuilder::new(&b"once"[..]).sign(&signer).await.unwrap();
        let before = item.clone();

        assert!(matches!(item.sign(&signer).await, Err(CoreError::AlreadySigned)));
        assert_eq!(item, before);
    }

    #[tokio::test]
    async fn test_failed_sign_leaves_item_unsigned() {
        let signer = FailingSigner {
            owner: fixed_signer().public_key().to_vec(),
            signature: None,
        };
        let mut item = DataItemBuilder::new(&b"payload"[..])
            .build_unsigned(SignatureType::Ethereum, signer.public_key())
            .unwrap();

        let result = item.sign(&signer).await;
        assert!(matches!(
            result,
            Err(CoreError::Signing(SignerError::Rejected(_)))
        ));
        assert!(!item.is_signed());
    }

    #[tokio::test]
    async fn test_wrong_signature_length_rejected() {
        let signer = FailingSigner {
            owner: fixed_signer().public_key().to_vec(),
            signature: Some(vec![1u8; 64]),
        };
        let mut item = DataItemBuilder::new(&b"payload"[..])
            .build_unsigned(SignatureType::Ethereum, signer.public_key())
            .unwrap();

        assert!(item.sign(&signer).await.is_err());
        assert!(!item.is_signed());
    }

    #[tokio::test]
    async fn test_foreign_signer_rejected() {
        let owner = fixed_signer();
        let other = LocalSigner::generate();
        let mut item = DataItemBuilder::new(&b"payload"[..])
            .build_unsigned(SignatureType::Ethereum, owner.public_key())
            .unwrap();

        assert!(item.sign(&other).await.is_err());
        assert!(!item.is_signed());
    }

    #[tokio::test]
    async fn test_binary_layout() {
        let signer = fixed_signer();
        let item = DataItemBuilder::new(&b"abc"[..])
            .tag("a", "b")
            .sign(&signer)
            .await
            .unwrap();
        let bytes = item.to_bytes();

        assert_eq!(bytes.len(), item.len());
        assert_eq!(&bytes[0..2], &[3, 0]);
        assert_eq!(&bytes[2..67], item.signature());
        assert_eq!(&bytes[67..132], signer.public_key());
        assert_eq!(bytes[132], 0); // no target
        assert_eq!(bytes[133], 0); // no anchor
        assert_eq!(&bytes[134..142], &1u64.to_le_bytes());
        assert_eq!(&bytes[142..150], &6u64.to_le_bytes());
        assert_eq!(&bytes[150..156], &[0x02, 0x02, b'a', 0x02, b'b', 0x00]);
        assert_eq!(&bytes[156..], b"abc");
    }

    #[tokio::test]
    async fn test_parse_roundtrip_with_target_and_anchor() {
        let signer = fixed_signer();
        let item = DataItemBuilder::new(&b"anchored"[..])
            .target([0x11; 32])
            .anchor([0x22; 32])
            .tag("k", "v")
            .sign(&signer)
            .await
            .unwrap();

        let parsed = DataItem::from_bytes(&item.to_bytes()).unwrap();
        assert_eq!(parsed, item);
        assert!(parsed.is_valid());
        assert_eq!(parsed.target(), Some(&[0x11; 32]));
        assert_eq!(parsed.anchor(), Some(&[0x22; 32]));
    }

    #[tokio::test]
    async fn test_tampered_payload_invalid() {
        let signer = fixed_signer();
        let item = DataItemBuilder::new(&b"original"[..]).sign(&signer).await.unwrap();

        let mut bytes = item.to_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let tampered = DataItem::from_bytes(&bytes).unwrap();
        assert!(tampered.is_signed());
        assert!(!tampered.is_valid());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            DataItem::from_bytes(&[1, 0]),
            Err(CoreError::UnsupportedSignatureType(1))
        ));
        assert!(DataItem::from_bytes(&[3, 0, 0, 0]).is_err());

        let signer = fixed_signer();
        let item = DataItemBuilder::new(&b"x"[..])
            .build_unsigned(SignatureType::Ethereum, signer.public_key())
            .unwrap();
        let mut bytes = item.to_bytes().to_vec();
        bytes[132] = 2; // bad target flag
        assert!(matches!(
            DataItem::from_bytes(&bytes),
            Err(CoreError::MalformedDataItem(_))
        ));
    }

    #[test]
    fn test_signature_data_deterministic() {
        let signer = fixed_signer();
        let build = || {
            DataItemBuilder::new(&b"same"[..])
                .tag("a", "b")
                .build_unsigned(SignatureType::Ethereum, signer.public_key())
                .unwrap()
        };
        assert_eq!(build().signature_data(), build().signature_data());

        let other = DataItemBuilder::new(&b"same"[..])
            .tag("a", "c")
            .build_unsigned(SignatureType::Ethereum, signer.public_key())
            .unwrap();
        assert_ne!(build().signature_data(), other.signature_data());
    }
}
