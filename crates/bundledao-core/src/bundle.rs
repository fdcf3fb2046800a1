//! Bundles: a header table followed by concatenated data items.
//!
//! ```text
//! [8 bytes: item count N, little-endian]
//! [N x 64 bytes: (32-byte little-endian item length, 32-byte item id)]
//! [item_0][item_1]...[item_{N-1}]
//! ```

use bytes::Bytes;

use crate::data_item::DataItem;
use crate::error::{CoreError, Result};
use crate::types::DataItemId;

/// Length of the item count prefix.
pub const BUNDLE_COUNT_LENGTH: usize = 8;

/// Length of one header entry.
pub const BUNDLE_HEADER_LENGTH: usize = 64;

const LENGTH_FIELD: usize = 32;

/// One entry of the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleHeader {
    /// Serialized length of the item.
    pub length: u64,
    /// Id of the item.
    pub id: DataItemId,
}

/// Pack signed items into a bundle, preserving their order.
///
/// Fails with [`CoreError::UnsignedItem`] on the first unsigned item.
pub fn create_bundle(items: &[DataItem]) -> Result<Bundle> {
    if let Some(index) = items.iter().position(|item| !item.is_signed()) {
        return Err(CoreError::UnsignedItem { index });
    }

    let encoded: Vec<Bytes> = items.iter().map(DataItem::to_bytes).collect();
    let body_len: usize = encoded.iter().map(Bytes::len).sum();
    let mut buf =
        Vec::with_capacity(BUNDLE_COUNT_LENGTH + BUNDLE_HEADER_LENGTH * items.len() + body_len);

    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for (item, bytes) in items.iter().zip(&encoded) {
        let mut length = [0u8; LENGTH_FIELD];
        length[..8].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
        buf.extend_from_slice(&length);
        buf.extend_from_slice(item.id().as_bytes());
    }
    for bytes in &encoded {
        buf.extend_from_slice(bytes);
    }

    Ok(Bundle {
        raw: Bytes::from(buf),
    })
}

/// A serialized bundle.
///
/// Construction does not validate; [`Bundle::split`] and [`Bundle::verify`]
/// check the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    raw: Bytes,
}

impl Bundle {
    /// Wrap raw bundle bytes.
    pub fn from_bytes(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// The serialized bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Consume into the serialized bytes.
    pub fn into_bytes(self) -> Bytes {
        self.raw
    }

    /// Length of the serialized bundle.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The declared item count.
    pub fn item_count(&self) -> Result<u64> {
        let prefix = self
            .raw
            .get(..BUNDLE_COUNT_LENGTH)
            .ok_or_else(|| CoreError::MalformedBundle("missing item count".into()))?;
        let mut count = [0u8; BUNDLE_COUNT_LENGTH];
        count.copy_from_slice(prefix);
        Ok(u64::from_le_bytes(count))
    }

    /// Parse the header table.
    pub fn headers(&self) -> Result<Vec<BundleHeader>> {
        let count = self.item_count()?;
        let table_end = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(BUNDLE_HEADER_LENGTH))
            .and_then(|n| n.checked_add(BUNDLE_COUNT_LENGTH))
            .filter(|end| *end <= self.raw.len())
            .ok_or_else(|| {
                CoreError::MalformedBundle(format!(
                    "{count} headers do not fit in {} bytes",
                    self.raw.len()
                ))
            })?;

        self.raw[BUNDLE_COUNT_LENGTH..table_end]
            .chunks_exact(BUNDLE_HEADER_LENGTH)
            .enumerate()
            .map(|(index, entry)| {
                let (length, id) = entry.split_at(LENGTH_FIELD);
                if length[8..].iter().any(|b| *b != 0) {
                    return Err(CoreError::MalformedBundle(format!(
                        "length of item {index} exceeds 64 bits"
                    )));
                }
                let mut low = [0u8; 8];
                low.copy_from_slice(&length[..8]);
                let id = DataItemId::try_from(id)
                    .map_err(|_| CoreError::MalformedBundle("short header id".into()))?;
                Ok(BundleHeader {
                    length: u64::from_le_bytes(low),
                    id,
                })
            })
            .collect()
    }

    /// Re-split the bundle into its items, in header order.
    ///
    /// Header lengths must tile the payload exactly, and every header id must
    /// match its item's id.
    pub fn split(&self) -> Result<Vec<DataItem>> {
        let headers = self.headers()?;
        let mut offset = BUNDLE_COUNT_LENGTH + BUNDLE_HEADER_LENGTH * headers.len();
        let mut items = Vec::with_capacity(headers.len());

        for (index, header) in headers.iter().enumerate() {
            let end = usize::try_from(header.length)
                .ok()
                .and_then(|len| offset.checked_add(len))
                .filter(|end| *end <= self.raw.len())
                .ok_or_else(|| {
                    CoreError::MalformedBundle(format!(
                        "item {index} of {} bytes overruns the bundle",
                        header.length
                    ))
                })?;

            let item = DataItem::from_bytes(&self.raw[offset..end])?;
            if item.id() != header.id {
                return Err(CoreError::MalformedBundle(format!(
                    "item {index} id {} does not match header {}",
                    item.id(),
                    header.id
                )));
            }
            items.push(item);
            offset = end;
        }

        if offset != self.raw.len() {
            return Err(CoreError::MalformedBundle(format!(
                "{} trailing bytes after last item",
                self.raw.len() - offset
            )));
        }
        Ok(items)
    }

    /// Whether the bundle splits cleanly and every item's signature is valid.
    pub fn verify(&self) -> bool {
        match self.split() {
            Ok(items) => items.iter().all(DataItem::is_valid),
            Err(_) => false,
        }
    }
}

impl AsRef<[u8]> for Bundle {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}
