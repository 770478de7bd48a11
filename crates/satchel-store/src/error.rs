use satchel_types::ItemKey;

/// Errors from aggregate store operations.
///
/// Every variant is returned before any field of the record is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Quantity was zero.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// The whitelist is non-empty and does not contain the item.
    #[error("{0} is not on the whitelist")]
    NotWhitelisted(ItemKey),

    /// Adding would push the total past the tier capacity.
    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: u64, available: u64 },

    /// The item kind was empty.
    #[error("item kind must not be empty")]
    EmptyKind,

    /// A new entry would push a collection past its encodable bound.
    #[error("{what} is full: at most {max} entries")]
    TooManyEntries { what: &'static str, max: usize },

    /// Assembled parts violate a record invariant.
    #[error("invalid record state: {0}")]
    InvalidState(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
