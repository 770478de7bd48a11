//! Versioned binary codec for container records.
//!
//! A record is written as a flat, length-prefixed byte sequence led by a
//! schema version byte. Item identities are opaque to the codec: an
//! [`ItemSerializer`] turns them into bytes and the codec only frames them.
//!
//! # Format (version 1, big-endian)
//!
//! ```text
//! u8   version
//! u8   tier ordinal
//! u32  durability
//! u8   sell flag (0 | 1)
//! u32  whitelist count,  then per entry: u32 len, identity bytes
//! u32  contents count,   then per entry: u32 len, identity bytes, u32 count
//! u32  reference count,  then per entry: u16 key, u32 len, identity bytes
//! ```
//!
//! Decoding never panics and never returns anything but a record or a
//! [`CorruptPayload`]. There is no migration path: any other version byte is
//! corrupt.

pub mod codec;
pub mod error;
pub mod serializer;

pub use codec::{ContainerCodec, MAX_COLLECTION_LEN, MAX_IDENTITY_LEN, SCHEMA_VERSION};
pub use error::{CodecError, CodecResult, CorruptPayload};
pub use serializer::{BincodeItemSerializer, ItemSerializer};
