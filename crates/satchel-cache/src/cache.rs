use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use satchel_codec::ContainerCodec;
use satchel_store::ContainerRecord;
use satchel_types::{ContainerId, HolderId, Tier};
use tracing::{debug, warn};

use crate::carrier::Carrier;
use crate::error::{CacheError, CacheResult};
use crate::render::{NoOpRenderer, RecordRenderer};

/// Arena of decoded records keyed by container id, plus the holder index.
///
/// Both maps are `DashMap`s; every compound step uses the entry API so two
/// call sites racing on the same key never see a half-applied update.
/// Concurrent mutation of the *same* record must still be serialized by the
/// caller.
pub struct ContainerCache {
    records: DashMap<ContainerId, ContainerRecord>,
    holders: DashMap<HolderId, HashSet<ContainerId>>,
    codec: ContainerCodec,
    renderer: Arc<dyn RecordRenderer>,
    fallback_tier: Tier,
}

impl ContainerCache {
    /// Create an empty cache.
    pub fn new(codec: ContainerCodec, renderer: Arc<dyn RecordRenderer>) -> Self {
        Self {
            records: DashMap::new(),
            holders: DashMap::new(),
            codec,
            renderer,
            fallback_tier: Tier::default(),
        }
    }

    /// Tier used when healing a carrier whose declared tier is missing or unknown.
    pub fn with_fallback_tier(mut self, tier: Tier) -> Self {
        self.fallback_tier = tier;
        self
    }

    pub fn codec(&self) -> &ContainerCodec {
        &self.codec
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of a cached record, without touching any carrier.
    pub fn cached(&self, id: &ContainerId) -> Option<ContainerRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    // ---------------------------------------------------------------
    // Carrier-facing operations
    // ---------------------------------------------------------------

    /// Turn `carrier` into a brand-new container of `tier`.
    ///
    /// Mints an id, caches a default record, and persists it immediately.
    pub fn create(&self, carrier: &mut dyn Carrier, tier: Tier) -> CacheResult<ContainerRecord> {
        let record = ContainerRecord::new(ContainerId::new(), tier);
        self.persist(carrier, &record)?;
        self.records.insert(record.id(), record.clone());
        debug!(id = %record.id().short_id(), %tier, "container created");
        Ok(record)
    }

    /// Resolve the container id declared by `carrier`.
    pub fn identify(&self, carrier: &dyn Carrier) -> CacheResult<ContainerId> {
        if !carrier.is_container() {
            return Err(CacheError::NotAContainer);
        }
        let raw = carrier.container_id().unwrap_or_default();
        ContainerId::parse(&raw).map_err(|e| {
            warn!(error = %e, "container carrier without usable id; treating as plain item");
            CacheError::MissingIdentity(e.to_string())
        })
    }

    /// Load the record for `carrier`.
    ///
    /// A cache hit is returned as is. On a miss the blob is decoded; a
    /// corrupt blob is replaced by a fresh default record at the carrier's
    /// declared tier, which is persisted straight away.
    pub fn load(&self, carrier: &mut dyn Carrier) -> CacheResult<ContainerRecord> {
        let id = self.identify(carrier)?;
        if let Some(hit) = self.records.get(&id) {
            debug!(id = %id.short_id(), "cache hit");
            return Ok(hit.value().clone());
        }

        let decoded = match carrier.blob() {
            Some(text) => self.codec.decode_text(id, &text),
            None => Err(satchel_codec::CorruptPayload::new("missing blob")),
        };
        let (record, healed) = match decoded {
            Ok(record) => {
                debug!(id = %id.short_id(), "cache miss; decoded carrier");
                (record, false)
            }
            Err(corrupt) => {
                let tier = self.declared_tier(carrier);
                warn!(
                    id = %id.short_id(),
                    reason = %corrupt.reason,
                    %tier,
                    "corrupt container payload; resetting to default"
                );
                (ContainerRecord::new(id, tier), true)
            }
        };

        // Another call site may have populated the entry meanwhile; the
        // cached record stays authoritative and is what gets written back.
        let kept = self.records.entry(id).or_insert(record).value().clone();
        if healed {
            if let Err(e) = self.persist(carrier, &kept) {
                warn!(id = %id.short_id(), error = %e, "failed to persist healed record");
            }
        }
        Ok(kept)
    }

    /// Write `record` to the four carrier fields and notify the renderer.
    ///
    /// Persisting the same record twice writes identical fields.
    pub fn persist(&self, carrier: &mut dyn Carrier, record: &ContainerRecord) -> CacheResult<()> {
        let text = self.codec.encode_text(record)?;
        carrier.set_container(true);
        carrier.set_container_id(&record.id().to_string());
        carrier.set_tier(record.tier().ordinal());
        carrier.set_blob(&text);
        self.renderer.render(record);
        debug!(id = %record.id().short_id(), bytes = text.len() / 2, "persisted");
        Ok(())
    }

    /// Load, mutate, and persist in one step.
    ///
    /// `f` works on a copy. The copy replaces the cached record only once it
    /// has been written to the carrier, so a failed persist leaves both the
    /// cache and the carrier as they were. The record is persisted whatever
    /// `f` returns; an unchanged record persists to identical bytes.
    pub fn update<R>(
        &self,
        carrier: &mut dyn Carrier,
        f: impl FnOnce(&mut ContainerRecord) -> R,
    ) -> CacheResult<R> {
        let mut record = self.load(carrier)?;
        let out = f(&mut record);
        self.persist(carrier, &record)?;
        self.records.insert(record.id(), record);
        Ok(out)
    }

    /// Mutate the cached record for `carrier` without writing it back.
    ///
    /// `f` runs while the cache entry is locked, so it must not call back
    /// into the cache. Follow with [`flush`](Self::flush) before the carrier
    /// leaves tracked scope.
    pub fn modify<R>(
        &self,
        carrier: &mut dyn Carrier,
        f: impl FnOnce(&mut ContainerRecord) -> R,
    ) -> CacheResult<R> {
        let loaded = self.load(carrier)?;
        let mut entry = self.records.entry(loaded.id()).or_insert(loaded);
        Ok(f(entry.value_mut()))
    }

    /// Persist the cached record for `carrier`.
    pub fn flush(&self, carrier: &mut dyn Carrier) -> CacheResult<()> {
        let record = self.load(carrier)?;
        self.persist(carrier, &record)
    }

    /// Persist the cached record, evict it, and drop it from the holder's index.
    ///
    /// Used when a carrier leaves tracked scope. A carrier with no cached
    /// record is only dropped from the index.
    pub fn detach(&self, holder: HolderId, carrier: &mut dyn Carrier) -> CacheResult<()> {
        let id = self.identify(carrier)?;
        if let Some(record) = self.cached(&id) {
            self.persist(carrier, &record)?;
            self.records.remove(&id);
        }
        self.untrack(holder, &id);
        debug!(id = %id.short_id(), holder = %holder.short_id(), "detached");
        Ok(())
    }

    /// Rebuild `holder`'s index from a fresh scan of its carriers.
    ///
    /// Every container carrier found is loaded (healing corrupt ones). Returns
    /// the number of containers now tracked.
    pub fn rescan<'a>(
        &self,
        holder: HolderId,
        carriers: impl IntoIterator<Item = &'a mut dyn Carrier>,
    ) -> usize {
        let mut ids = HashSet::new();
        for carrier in carriers {
            if !carrier.is_container() {
                continue;
            }
            match self.load(carrier) {
                Ok(record) => {
                    ids.insert(record.id());
                }
                Err(e) => debug!(holder = %holder.short_id(), error = %e, "skipping carrier in rescan"),
            }
        }
        let count = ids.len();
        self.holders.insert(holder, ids);
        debug!(holder = %holder.short_id(), tracked = count, "holder index rebuilt");
        count
    }

    /// Persist and evict every tracked container found among `carriers`, then
    /// forget the holder's index.
    ///
    /// A carrier that fails to persist does not stop the others; its record
    /// stays cached and the first such error is returned after the index is
    /// dropped. Tracked ids with no matching carrier stay cached as harmless
    /// orphans.
    pub fn release<'a>(
        &self,
        holder: HolderId,
        carriers: impl IntoIterator<Item = &'a mut dyn Carrier>,
    ) -> CacheResult<usize> {
        let tracked: HashSet<ContainerId> = self.tracked(holder).into_iter().collect();
        let mut released = 0;
        let mut first_error = None;
        for carrier in carriers {
            let Ok(id) = self.identify(carrier) else {
                continue;
            };
            if !tracked.contains(&id) {
                continue;
            }
            match self.detach(holder, carrier) {
                Ok(()) => released += 1,
                Err(e) => {
                    warn!(id = %id.short_id(), holder = %holder.short_id(), error = %e, "failed to release container");
                    first_error.get_or_insert(e);
                }
            }
        }
        self.holders.remove(&holder);
        debug!(holder = %holder.short_id(), released, "holder released");
        match first_error {
            Some(e) => Err(e),
            None => Ok(released),
        }
    }

    // ---------------------------------------------------------------
    // Holder index
    // ---------------------------------------------------------------

    /// Record that `holder` carries container `id`.
    pub fn track(&self, holder: HolderId, id: ContainerId) {
        self.holders.entry(holder).or_default().insert(id);
    }

    /// Forget that `holder` carries container `id`.
    pub fn untrack(&self, holder: HolderId, id: &ContainerId) {
        if let Some(mut ids) = self.holders.get_mut(&holder) {
            ids.remove(id);
        }
        self.holders.remove_if(&holder, |_, ids| ids.is_empty());
    }

    /// Ids tracked for `holder`, in ascending (creation) order.
    pub fn tracked(&self, holder: HolderId) -> Vec<ContainerId> {
        let mut ids: Vec<ContainerId> = self
            .holders
            .get(&holder)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn is_tracked(&self, holder: HolderId, id: &ContainerId) -> bool {
        self.holders
            .get(&holder)
            .is_some_and(|ids| ids.contains(id))
    }

    fn declared_tier(&self, carrier: &dyn Carrier) -> Tier {
        carrier
            .tier()
            .and_then(Tier::from_ordinal)
            .unwrap_or(self.fallback_tier)
    }
}

impl Default for ContainerCache {
    fn default() -> Self {
        Self::new(ContainerCodec::default(), Arc::new(NoOpRenderer))
    }
}

impl std::fmt::Debug for ContainerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerCache")
            .field("records", &self.records.len())
            .field("holders", &self.holders.len())
            .finish()
    }
}
