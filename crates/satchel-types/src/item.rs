use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a stackable item.
///
/// Two keys are equal iff their `kind` and canonical metadata are equal.
/// Metadata is kept in a `BTreeMap` so equality, hashing, and serialized
/// form never depend on insertion order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    /// Base item type, e.g. `"stone"`.
    pub kind: String,
    /// Canonical metadata distinguishing otherwise identical kinds.
    pub meta: BTreeMap<String, String>,
}

impl ItemKey {
    /// Create a key with no metadata.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            meta: BTreeMap::new(),
        }
    }

    /// Builder-style metadata attachment.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the key carries no metadata.
    pub fn is_plain(&self) -> bool {
        self.meta.is_empty()
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({self})")
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.meta.is_empty() {
            let parts: Vec<String> = self.meta.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "[{}]", parts.join(","))?;
        }
        Ok(())
    }
}
