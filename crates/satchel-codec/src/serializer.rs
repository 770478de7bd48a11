use bincode::Options;
use satchel_types::ItemKey;

use crate::codec::MAX_IDENTITY_LEN;
use crate::error::{CodecError, CodecResult};

/// Turns item identities into opaque bytes and back.
///
/// The container codec frames whatever this produces with a length prefix and
/// never looks inside.
pub trait ItemSerializer: Send + Sync {
    fn serialize(&self, item: &ItemKey) -> CodecResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> CodecResult<ItemKey>;
}

/// Default serializer: bincode with varint integers and a size limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeItemSerializer;

impl BincodeItemSerializer {
    fn options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(MAX_IDENTITY_LEN as u64)
            .reject_trailing_bytes()
    }
}

impl ItemSerializer for BincodeItemSerializer {
    fn serialize(&self, item: &ItemKey) -> CodecResult<Vec<u8>> {
        if item.kind.is_empty() {
            return Err(CodecError::Serialization("empty item kind".into()));
        }
        Self::options()
            .serialize(item)
            .map_err(|e| CodecError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> CodecResult<ItemKey> {
        let item: ItemKey = Self::options()
            .deserialize(bytes)
            .map_err(|e| CodecError::Deserialization(e.to_string()))?;
        if item.kind.is_empty() {
            return Err(CodecError::Deserialization("empty item kind".into()));
        }
        Ok(item)
    }
}
