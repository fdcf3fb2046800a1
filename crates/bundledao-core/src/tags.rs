//! Data item tags and their Avro encoding.
//!
//! Tags are serialized as an Avro array of `{name: bytes, value: bytes}`
//! records: a zig-zag varint block count, each record as two
//! length-prefixed byte strings, and a terminating zero block. An empty tag
//! list serializes to zero bytes.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Maximum number of tags on a data item.
pub const MAX_TAGS: usize = 128;

/// Maximum byte length of a tag name.
pub const MAX_TAG_NAME_BYTES: usize = 1024;

/// Maximum byte length of a tag value.
pub const MAX_TAG_VALUE_BYTES: usize = 3072;

/// A name/value metadata pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Check tag count and field sizes.
pub fn validate_tags(tags: &[Tag]) -> Result<()> {
    if tags.len() > MAX_TAGS {
        return Err(CoreError::InvalidTag(format!(
            "{} tags exceeds maximum of {MAX_TAGS}",
            tags.len()
        )));
    }
    for tag in tags {
        if tag.name.is_empty() || tag.name.len() > MAX_TAG_NAME_BYTES {
            return Err(CoreError::InvalidTag(format!(
                "name must be 1..={MAX_TAG_NAME_BYTES} bytes, got {}",
                tag.name.len()
            )));
        }
        if tag.value.is_empty() || tag.value.len() > MAX_TAG_VALUE_BYTES {
            return Err(CoreError::InvalidTag(format!(
                "value of {:?} must be 1..={MAX_TAG_VALUE_BYTES} bytes, got {}",
                tag.name,
                tag.value.len()
            )));
        }
    }
    Ok(())
}

/// Serialize tags after validating them.
pub fn serialize_tags(tags: &[Tag]) -> Result<Vec<u8>> {
    validate_tags(tags)?;
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let mut buf = Vec::new();
    write_long(&mut buf, tags.len() as i64);
    for tag in tags {
        write_bytes(&mut buf, tag.name.as_bytes());
        write_bytes(&mut buf, tag.value.as_bytes());
    }
    write_long(&mut buf, 0);
    Ok(buf)
}

/// Deserialize tags, accepting any valid Avro block layout.
pub fn deserialize_tags(bytes: &[u8]) -> Result<Vec<Tag>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Reader { bytes, pos: 0 };
    let mut tags = Vec::new();
    loop {
        let mut count = reader.read_long()?;
        if count == 0 {
            break;
        }
        if count < 0 {
            // Negative count: a byte size for the block follows.
            count = count
                .checked_neg()
                .ok_or_else(|| CoreError::InvalidTag("block count overflow".into()))?;
            reader.read_long()?;
        }
        for _ in 0..count {
            if tags.len() >= MAX_TAGS {
                return Err(CoreError::InvalidTag(format!(
                    "more than {MAX_TAGS} tags"
                )));
            }
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            tags.push(Tag { name, value });
        }
    }

    if reader.pos != bytes.len() {
        return Err(CoreError::InvalidTag(format!(
            "{} trailing bytes after tags",
            bytes.len() - reader.pos
        )));
    }
    Ok(tags)
}

/// Write a zig-zag varint.
fn write_long(buf: &mut Vec<u8>, n: i64) {
    let mut m = ((n << 1) ^ (n >> 63)) as u64;
    loop {
        let byte = (m & 0x7f) as u8;
        m >>= 7;
        if m == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_long(buf, bytes.len() as i64);
    buf.extend_from_slice(bytes);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn read_long(&mut self) -> Result<i64> {
        let mut m: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or_else(|| CoreError::InvalidTag("truncated varint".into()))?;
            self.pos += 1;
            if shift > 63 {
                return Err(CoreError::InvalidTag("varint too long".into()));
            }
            m |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok((m >> 1) as i64 ^ -((m & 1) as i64))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_long()?;
        let len = usize::try_from(len)
            .map_err(|_| CoreError::InvalidTag(format!("negative length {len}")))?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CoreError::InvalidTag("truncated string".into()))?;
        let s = std::str::from_utf8(&self.bytes[self.pos..end])
            .map_err(|e| CoreError::InvalidTag(format!("invalid UTF-8: {e}")))?
            .to_string();
        self.pos = end;
        Ok(s)
    }
}
