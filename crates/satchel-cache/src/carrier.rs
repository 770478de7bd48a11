//! The carrier contract: the physical object a container lives on.
//!
//! The engine reads and writes exactly four fields and nothing else. Hosts
//! map them onto whatever persistent metadata their objects expose.

/// Get/set access to the four fields the engine owns on a carrier.
pub trait Carrier {
    fn is_container(&self) -> bool;
    fn set_container(&mut self, flag: bool);

    /// Textual container id, if one was ever assigned.
    ///
    /// The engine only writes hyphenated UUIDs here. Anything that does not
    /// parse as a UUID is treated as a missing identity.
    fn container_id(&self) -> Option<String>;
    fn set_container_id(&mut self, id: &str);

    /// Declared tier ordinal, if any.
    fn tier(&self) -> Option<i32>;
    fn set_tier(&mut self, tier: i32);

    /// Encoded record text, if any.
    fn blob(&self) -> Option<String>;
    fn set_blob(&mut self, blob: &str);
}

/// Plain-struct carrier for tests and embedding.
///
/// Cloning one models a host duplicating the physical object: both copies
/// share the same id and bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryCarrier {
    pub is_container: bool,
    pub id: Option<String>,
    pub tier: Option<i32>,
    pub blob: Option<String>,
}

impl InMemoryCarrier {
    /// A carrier that is not (yet) a container.
    pub fn new() -> Self {
        Self::default()
    }

    /// A carrier carrying arbitrary raw fields, e.g. a hand-crafted payload.
    pub fn with_fields(id: impl Into<String>, tier: i32, blob: impl Into<String>) -> Self {
        Self {
            is_container: true,
            id: Some(id.into()),
            tier: Some(tier),
            blob: Some(blob.into()),
        }
    }
}

impl Carrier for InMemoryCarrier {
    fn is_container(&self) -> bool {
        self.is_container
    }

    fn set_container(&mut self, flag: bool) {
        self.is_container = flag;
    }

    fn container_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_container_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    fn tier(&self) -> Option<i32> {
        self.tier
    }

    fn set_tier(&mut self, tier: i32) {
        self.tier = Some(tier);
    }

    fn blob(&self) -> Option<String> {
        self.blob.clone()
    }

    fn set_blob(&mut self, blob: &str) {
        self.blob = Some(blob.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_carrier_is_not_a_container() {
        let c = InMemoryCarrier::new();
        assert!(!c.is_container());
        assert!(c.container_id().is_none());
        assert!(c.blob().is_none());
    }

    #[test]
    fn setters_write_fields() {
        let mut c = InMemoryCarrier::new();
        c.set_container(true);
        c.set_container_id("abc");
        c.set_tier(3);
        c.set_blob("00ff");
        assert_eq!(c, InMemoryCarrier::with_fields("abc", 3, "00ff"));
    }
}
