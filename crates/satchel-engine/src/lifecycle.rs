//! Host lifecycle events mapped onto cache and index operations.
//!
//! Hosts call these from their own event callbacks. Each hook is a thin
//! translation; all state lives in the [`ContainerCache`].

use satchel_cache::{CacheError, Carrier, ContainerCache, Holder};
use satchel_types::{ContainerId, HolderId, Tier};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Borrowed view over the engine's cache, handed out by
/// [`Satchel::lifecycle`](crate::Satchel::lifecycle).
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle<'a> {
    cache: &'a ContainerCache,
    config: &'a EngineConfig,
}

impl<'a> Lifecycle<'a> {
    pub(crate) fn new(cache: &'a ContainerCache, config: &'a EngineConfig) -> Self {
        Self { cache, config }
    }

    /// A carrier was instantiated.
    ///
    /// A carrier that already declares a container id is loaded rather than
    /// re-minted, so a host firing this twice cannot orphan the first id.
    pub fn on_carrier_created(
        &self,
        carrier: &mut dyn Carrier,
        tier: Option<Tier>,
    ) -> EngineResult<ContainerId> {
        if let Ok(id) = self.cache.identify(carrier) {
            self.cache.load(carrier)?;
            debug!(id = %id.short_id(), "carrier already a container");
            return Ok(id);
        }
        let record = self
            .cache
            .create(carrier, tier.unwrap_or(self.config.default_tier))?;
        Ok(record.id())
    }

    /// A single carrier entered `holder`'s scope.
    pub fn on_carrier_acquired(
        &self,
        holder: HolderId,
        carrier: &mut dyn Carrier,
    ) -> EngineResult<ContainerId> {
        let id = self.cache.load(carrier)?.id();
        self.cache.track(holder, id);
        Ok(id)
    }

    /// `holder` connected. Returns the number of containers tracked.
    pub fn on_holder_join(&self, holder: &mut dyn Holder) -> usize {
        let id = holder.holder_id();
        self.cache.rescan(id, holder.carriers_mut())
    }

    /// `holder` disconnected. Persists and evicts its containers.
    pub fn on_holder_leave(&self, holder: &mut dyn Holder) -> EngineResult<usize> {
        let id = holder.holder_id();
        Ok(self.cache.release(id, holder.carriers_mut())?)
    }

    /// `carrier` left `holder`'s scope (dropped, moved to an untracked place).
    ///
    /// Plain items are ignored.
    pub fn on_carrier_detached(
        &self,
        holder: HolderId,
        carrier: &mut dyn Carrier,
    ) -> EngineResult<()> {
        match self.cache.detach(holder, carrier) {
            Ok(()) | Err(CacheError::NotAContainer) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The host reshuffled `holder`'s carriers wholesale.
    pub fn on_holder_bulk_refresh(&self, holder: &mut dyn Holder) -> usize {
        let id = holder.holder_id();
        self.cache.rescan(id, holder.carriers_mut())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::EngineError;
    use crate::{EngineConfig, InMemoryCarrier, InMemoryHolder, ItemKey, Satchel};
    use satchel_cache::{CacheError, Carrier, Holder};
    use satchel_types::{HolderId, Tier};

    fn holder_with(satchel: &Satchel, containers: usize, plain: usize) -> InMemoryHolder {
        let mut holder = InMemoryHolder::new(HolderId::ephemeral());
        for _ in 0..containers {
            let mut c = InMemoryCarrier::new();
            satchel.lifecycle().on_carrier_created(&mut c, None).unwrap();
            holder.push(c);
        }
        for _ in 0..plain {
            holder.push(InMemoryCarrier::new());
        }
        holder
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    #[test]
    fn created_uses_configured_default_tier() {
        let satchel = Satchel::new(EngineConfig {
            default_tier: Tier::Three,
            ..EngineConfig::default()
        });
        let mut c = InMemoryCarrier::new();
        let id = satchel.lifecycle().on_carrier_created(&mut c, None).unwrap();
        assert!(c.is_container());
        assert_eq!(c.tier(), Some(3));
        assert_eq!(satchel.cache().cached(&id).unwrap().tier(), Tier::Three);
    }

    #[test]
    fn created_with_explicit_tier() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut c = InMemoryCarrier::new();
        let id = satchel
            .lifecycle()
            .on_carrier_created(&mut c, Some(Tier::Five))
            .unwrap();
        assert_eq!(satchel.cache().cached(&id).unwrap().capacity(), 25_000);
    }

    #[test]
    fn created_twice_keeps_first_id() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut c = InMemoryCarrier::new();
        let first = satchel.lifecycle().on_carrier_created(&mut c, None).unwrap();
        let second = satchel
            .lifecycle()
            .on_carrier_created(&mut c, Some(Tier::Two))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(c.tier(), Some(1));
    }

    // ---------------------------------------------------------------
    // Holder scope
    // ---------------------------------------------------------------

    #[test]
    fn join_tracks_only_containers() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut holder = holder_with(&satchel, 3, 2);
        assert_eq!(satchel.lifecycle().on_holder_join(&mut holder), 3);
        assert_eq!(satchel.cache().tracked(holder.holder_id()).len(), 3);
    }

    #[test]
    fn acquired_tracks_single_carrier() {
        let satchel = Satchel::new(EngineConfig::default());
        let holder = HolderId::ephemeral();
        let mut c = InMemoryCarrier::new();
        satchel.lifecycle().on_carrier_created(&mut c, None).unwrap();
        let id = satchel.lifecycle().on_carrier_acquired(holder, &mut c).unwrap();
        assert!(satchel.cache().is_tracked(holder, &id));
    }

    #[test]
    fn acquiring_plain_item_fails() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut c = InMemoryCarrier::new();
        let err = satchel
            .lifecycle()
            .on_carrier_acquired(HolderId::ephemeral(), &mut c)
            .unwrap_err();
        assert!(matches!(err, EngineError::Cache(CacheError::NotAContainer)));
    }

    #[test]
    fn leave_persists_and_evicts() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut holder = holder_with(&satchel, 2, 1);
        satchel.lifecycle().on_holder_join(&mut holder);
        satchel
            .deposit(&mut holder.carriers[0], &ItemKey::new("stone"), 5)
            .unwrap();

        assert_eq!(satchel.lifecycle().on_holder_leave(&mut holder).unwrap(), 2);
        assert!(satchel.cache().is_empty());
        assert!(satchel.cache().tracked(holder.holder_id()).is_empty());

        // A fresh engine decodes what was written back.
        let other = Satchel::new(EngineConfig::default());
        let record = other.inspect(&mut holder.carriers[0]).unwrap();
        assert_eq!(record.count_of(&ItemKey::new("stone")), 5);
    }

    #[test]
    fn detached_container_leaves_index() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut holder = holder_with(&satchel, 2, 0);
        let holder_id = holder.holder_id();
        satchel.lifecycle().on_holder_join(&mut holder);

        let mut dropped = holder.carriers.remove(0);
        satchel
            .lifecycle()
            .on_carrier_detached(holder_id, &mut dropped)
            .unwrap();
        assert_eq!(satchel.cache().tracked(holder_id).len(), 1);
        assert_eq!(satchel.cache().len(), 1);
    }

    #[test]
    fn detaching_plain_item_is_a_no_op() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut c = InMemoryCarrier::new();
        satchel
            .lifecycle()
            .on_carrier_detached(HolderId::ephemeral(), &mut c)
            .unwrap();
        assert_eq!(c, InMemoryCarrier::new());
    }

    #[test]
    fn bulk_refresh_resyncs_index() {
        let satchel = Satchel::new(EngineConfig::default());
        let mut holder = holder_with(&satchel, 3, 0);
        let holder_id = holder.holder_id();
        satchel.lifecycle().on_holder_join(&mut holder);

        // Host moved one carrier out without telling us.
        holder.carriers.pop();
        assert_eq!(satchel.cache().tracked(holder_id).len(), 3);
        assert_eq!(satchel.lifecycle().on_holder_bulk_refresh(&mut holder), 2);
        assert_eq!(satchel.cache().tracked(holder_id).len(), 2);
    }
}
