use thiserror::Error;

/// Errors from the encode side and from item serializers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("{what} too large: {len} (max {max})")]
    TooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// The payload could not be decoded into a valid record.
///
/// Covers version mismatch, short reads, unknown enum values, undecodable
/// identities, and out-of-bound counts. Callers recover by resetting the
/// container to a fresh default record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("corrupt payload: {reason}")]
pub struct CorruptPayload {
    pub reason: String,
}

impl CorruptPayload {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
