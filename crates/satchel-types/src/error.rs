use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown tier ordinal: {0}")]
    UnknownTier(i32),
}
