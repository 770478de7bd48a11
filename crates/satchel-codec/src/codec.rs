use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use satchel_store::{ContainerRecord, RecordParts};
use satchel_types::{ContainerId, ItemKey, Tier};
use tracing::trace;

use crate::error::{CodecError, CodecResult, CorruptPayload};
use crate::serializer::{BincodeItemSerializer, ItemSerializer};

/// Current schema version. Anything else on decode is corrupt.
pub const SCHEMA_VERSION: u8 = 1;

/// Upper bound on any collection count, checked before allocating. The store
/// enforces the same bound, so every reachable record encodes.
pub const MAX_COLLECTION_LEN: usize = satchel_store::MAX_ENTRIES;

/// Upper bound on one serialized identity.
pub const MAX_IDENTITY_LEN: usize = 64 * 1024;

/// Encodes and decodes container records.
///
/// Cheap to clone; the item serializer is shared.
#[derive(Clone)]
pub struct ContainerCodec {
    items: Arc<dyn ItemSerializer>,
}

impl ContainerCodec {
    /// Create a codec that frames identities produced by `items`.
    pub fn new(items: Arc<dyn ItemSerializer>) -> Self {
        Self { items }
    }

    /// Encode a record. The id is not part of the payload; it lives in its
    /// own carrier field.
    pub fn encode(&self, record: &ContainerRecord) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64);
        buf.push(SCHEMA_VERSION);
        buf.push(record.tier().ordinal() as u8);
        buf.extend_from_slice(&record.durability().to_be_bytes());
        buf.push(u8::from(record.sell_enabled()));

        write_count(&mut buf, "whitelist", record.whitelist().len())?;
        for item in record.whitelist() {
            self.write_item(&mut buf, item)?;
        }

        write_count(&mut buf, "contents", record.contents().len())?;
        for (item, count) in record.contents() {
            self.write_item(&mut buf, item)?;
            buf.extend_from_slice(&count.to_be_bytes());
        }

        write_count(&mut buf, "reference table", record.reference_table().len())?;
        for (key, item) in record.reference_table() {
            buf.extend_from_slice(&key.to_be_bytes());
            self.write_item(&mut buf, item)?;
        }

        Ok(buf)
    }

    /// Decode a payload into a record for `id`.
    pub fn decode(&self, id: ContainerId, data: &[u8]) -> Result<ContainerRecord, CorruptPayload> {
        let result = self.decode_inner(id, data);
        if let Err(e) = &result {
            trace!(id = %id.short_id(), reason = %e.reason, "payload rejected");
        }
        result
    }

    /// Encode to the lowercase hex text stored in a carrier's blob field.
    pub fn encode_text(&self, record: &ContainerRecord) -> CodecResult<String> {
        self.encode(record).map(hex::encode)
    }

    /// Decode from the hex text stored in a carrier's blob field.
    pub fn decode_text(&self, id: ContainerId, text: &str) -> Result<ContainerRecord, CorruptPayload> {
        let data = hex::decode(text.trim())
            .map_err(|e| CorruptPayload::new(format!("blob is not hex: {e}")))?;
        self.decode(id, &data)
    }

    fn decode_inner(&self, id: ContainerId, data: &[u8]) -> Result<ContainerRecord, CorruptPayload> {
        let mut r = Reader::new(data);

        let version = r.u8()?;
        if version != SCHEMA_VERSION {
            return Err(CorruptPayload::new(format!(
                "schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }

        let tier_byte = r.u8()?;
        let tier = Tier::from_ordinal(i32::from(tier_byte))
            .ok_or_else(|| CorruptPayload::new(format!("unknown tier {tier_byte}")))?;
        let durability = r.u32()?;
        let sell_enabled = match r.u8()? {
            0 => false,
            1 => true,
            other => return Err(CorruptPayload::new(format!("invalid sell flag {other}"))),
        };

        let n = r.count("whitelist")?;
        let mut whitelist = IndexSet::with_capacity(n);
        for _ in 0..n {
            let item = self.read_item(&mut r)?;
            if !whitelist.insert(item) {
                return Err(CorruptPayload::new("duplicate whitelist entry"));
            }
        }

        let n = r.count("contents")?;
        let mut contents = IndexMap::with_capacity(n);
        for _ in 0..n {
            let item = self.read_item(&mut r)?;
            let count = r.u32()?;
            if contents.insert(item, count).is_some() {
                return Err(CorruptPayload::new("duplicate contents entry"));
            }
        }

        let n = r.count("reference table")?;
        let mut reference_table = BTreeMap::new();
        for _ in 0..n {
            let key = r.u16()?;
            let item = self.read_item(&mut r)?;
            if reference_table.insert(key, item).is_some() {
                return Err(CorruptPayload::new(format!("duplicate reference key {key}")));
            }
        }

        if r.remaining() != 0 {
            return Err(CorruptPayload::new(format!("{} trailing bytes", r.remaining())));
        }

        ContainerRecord::from_parts(RecordParts {
            id,
            tier,
            durability,
            sell_enabled,
            whitelist,
            contents,
            reference_table,
        })
        .map_err(|e| CorruptPayload::new(e.to_string()))
    }

    fn write_item(&self, buf: &mut Vec<u8>, item: &ItemKey) -> CodecResult<()> {
        let bytes = self.items.serialize(item)?;
        if bytes.len() > MAX_IDENTITY_LEN {
            return Err(CodecError::TooLarge {
                what: "identity",
                len: bytes.len(),
                max: MAX_IDENTITY_LEN,
            });
        }
        buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(&bytes);
        Ok(())
    }

    fn read_item(&self, r: &mut Reader<'_>) -> Result<ItemKey, CorruptPayload> {
        let len = r.u32()? as usize;
        if len > MAX_IDENTITY_LEN {
            return Err(CorruptPayload::new(format!(
                "identity length {len} exceeds {MAX_IDENTITY_LEN}"
            )));
        }
        let bytes = r.take(len)?;
        self.items
            .deserialize(bytes)
            .map_err(|e| CorruptPayload::new(format!("invalid identity: {e}")))
    }
}

impl Default for ContainerCodec {
    fn default() -> Self {
        Self::new(Arc::new(BincodeItemSerializer))
    }
}

impl std::fmt::Debug for ContainerCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerCodec")
            .field("schema_version", &SCHEMA_VERSION)
            .finish()
    }
}

fn write_count(buf: &mut Vec<u8>, what: &'static str, len: usize) -> CodecResult<()> {
    if len > MAX_COLLECTION_LEN {
        return Err(CodecError::TooLarge {
            what,
            len,
            max: MAX_COLLECTION_LEN,
        });
    }
    buf.extend_from_slice(&(len as u32).to_be_bytes());
    Ok(())
}

/// Bounds-checked cursor over a payload.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CorruptPayload> {
        if self.remaining() < len {
            return Err(CorruptPayload::new(format!(
                "short read at offset {}: need {len}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CorruptPayload> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CorruptPayload> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, CorruptPayload> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, CorruptPayload> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Read a collection count and check it against the sane bound.
    fn count(&mut self, what: &str) -> Result<usize, CorruptPayload> {
        let n = self.u32()? as usize;
        if n > MAX_COLLECTION_LEN {
            return Err(CorruptPayload::new(format!(
                "{what} count {n} exceeds {MAX_COLLECTION_LEN}"
            )));
        }
        Ok(n)
    }
}
