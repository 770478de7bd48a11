use satchel_codec::CodecError;

/// Errors from cache operations.
///
/// Corrupt payloads never show up here: `load` heals them in place.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The carrier does not declare itself a container.
    #[error("carrier is not a container")]
    NotAContainer,

    /// The carrier is flagged as a container but has no usable id.
    #[error("container carrier has no usable id: {0}")]
    MissingIdentity(String),

    /// The record could not be encoded for write-back.
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
