use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Immutable identity of one container.
///
/// A `ContainerId` is minted exactly once, when a new carrier is declared a
/// container, and is never reused. It is time-ordered (UUID v7) so ids minted
/// later sort after earlier ones. The carrier stores it in its canonical
/// hyphenated form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(Uuid);

impl ContainerId {
    /// Mint a fresh, never-before-seen id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse the textual form stored on a carrier.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeError::InvalidId("empty".into()));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }

    /// Create from a raw UUID. Use `new()` for production code.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters), used in logs.
    pub fn short_id(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self.short_id())
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Identity of a holder: the actor whose scope may contain carriers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolderId(Uuid);

impl HolderId {
    /// Create from the host's UUID for the actor.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a random holder id for tests and demos.
    pub fn ephemeral() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the hyphenated or simple UUID form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Debug for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HolderId({})", self.short_id())
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
