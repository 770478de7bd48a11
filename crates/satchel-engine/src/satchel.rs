use std::collections::HashMap;
use std::sync::Arc;

use satchel_cache::{Carrier, ContainerCache, Holder, NoOpRenderer, RecordRenderer};
use satchel_codec::ContainerCodec;
use satchel_store::{ContainerRecord, PriceLookup, StoreError};
use satchel_types::{ContainerId, ItemKey};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::lifecycle::Lifecycle;
use crate::sell::{self, SellReport};
use crate::transfer::{self, ItemSink};

/// Entry point for hosts embedding Satchel.
pub struct Satchel {
    cache: ContainerCache,
    config: EngineConfig,
}

impl Satchel {
    /// Engine with the default codec and no renderer.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(config, ContainerCodec::default(), Arc::new(NoOpRenderer))
    }

    /// Engine with host-supplied collaborators.
    pub fn with_parts(
        config: EngineConfig,
        codec: ContainerCodec,
        renderer: Arc<dyn RecordRenderer>,
    ) -> Self {
        let cache = ContainerCache::new(codec, renderer).with_fallback_tier(config.default_tier);
        Self { cache, config }
    }

    pub fn cache(&self) -> &ContainerCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adapter mapping host lifecycle events onto cache operations.
    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(&self.cache, &self.config)
    }

    // ---- Single-container operations ----

    /// Current record for `carrier`.
    pub fn inspect(&self, carrier: &mut dyn Carrier) -> EngineResult<ContainerRecord> {
        Ok(self.cache.load(carrier)?)
    }

    /// Put `qty` units of `item` into the container, all or nothing.
    pub fn deposit(&self, carrier: &mut dyn Carrier, item: &ItemKey, qty: u32) -> EngineResult<()> {
        self.cache.update(carrier, |record| record.add_item(item, qty))??;
        Ok(())
    }

    /// Take up to `qty` units of `item` out. Returns the amount removed.
    pub fn withdraw(&self, carrier: &mut dyn Carrier, item: &ItemKey, qty: u32) -> EngineResult<u32> {
        Ok(self.cache.update(carrier, |record| record.remove_item(item, qty))?)
    }

    /// Toggle participation in batch selling.
    pub fn set_sell_enabled(&self, carrier: &mut dyn Carrier, enabled: bool) -> EngineResult<()> {
        Ok(self.cache.update(carrier, |record| record.set_sell_enabled(enabled))?)
    }

    /// Replace the whitelist, all or nothing. An empty list accepts everything.
    pub fn set_whitelist(&self, carrier: &mut dyn Carrier, items: Vec<ItemKey>) -> EngineResult<()> {
        self.cache.update(carrier, |record| {
            let mut next = record.clone();
            next.clear_whitelist();
            for item in items {
                next.allow(item)?;
            }
            *record = next;
            Ok::<_, StoreError>(())
        })??;
        Ok(())
    }

    /// Restore full durability.
    pub fn repair(&self, carrier: &mut dyn Carrier) -> EngineResult<()> {
        let id = self.cache.update(carrier, |record| {
            record.repair();
            record.id()
        })?;
        info!(id = %id.short_id(), "container repaired");
        Ok(())
    }

    /// Drain the container into `sink`. Returns the units moved.
    pub fn transfer_carrier<S: ItemSink + ?Sized>(
        &self,
        carrier: &mut dyn Carrier,
        sink: &mut S,
    ) -> EngineResult<u64> {
        let (id, moved) = self.cache.update(carrier, |record| {
            (record.id(), transfer::transfer_to_holder(record, sink))
        })?;
        debug!(id = %id.short_id(), moved, "transferred to holder");
        Ok(moved)
    }

    // ---- Batch operations ----

    /// Sell the vendable contents of every container tracked for `holder`.
    ///
    /// Broken containers and those with selling disabled are skipped. An
    /// eligible container holding nothing vendable is also skipped and takes
    /// no wear; only containers that sold at least one unit lose `sell_wear`
    /// durability. A container breaking mid-batch is reported, not fatal. Tracked ids with
    /// no matching carrier are pruned from the index when configured to.
    pub fn sell_all<P: PriceLookup + ?Sized>(&self, holder: &mut dyn Holder, prices: &P) -> SellReport {
        let holder_id = holder.holder_id();
        let mut carriers: HashMap<ContainerId, &mut dyn Carrier> = holder
            .carriers_mut()
            .into_iter()
            .filter_map(|carrier| {
                let id = self.cache.identify(&*carrier).ok()?;
                Some((id, carrier))
            })
            .collect();

        let mut report = SellReport::default();
        for id in self.cache.tracked(holder_id) {
            let Some(carrier) = carriers.get_mut(&id) else {
                if self.config.prune_stale_ids {
                    debug!(id = %id.short_id(), holder = %holder_id.short_id(), "pruning stale index entry");
                    self.cache.untrack(holder_id, &id);
                }
                continue;
            };

            let wear = self.config.sell_wear;
            let sale = match self
                .cache
                .modify(&mut **carrier, |record| sell::sell_record(record, prices, wear))
            {
                Ok(Some(sale)) => sale,
                Ok(None) => continue,
                Err(e) => {
                    warn!(id = %id.short_id(), error = %e, "skipping container in sell batch");
                    continue;
                }
            };
            if let Err(e) = self.cache.flush(&mut **carrier) {
                // The sale stands in the cache and reaches the carrier on the
                // next successful persist.
                warn!(id = %id.short_id(), error = %e, "sold but failed to persist");
                report.persist_failures.push(id);
            }

            if let Some(notice) = &sale.broke {
                info!(id = %notice.id.short_id(), tier = %notice.tier, "container broke during sell");
            }
            report.absorb(sale);
        }

        info!(
            holder = %holder_id.short_id(),
            total_value = report.total_value,
            containers = report.containers_sold,
            breaks = report.breaks.len(),
            "sell batch complete"
        );
        report
    }
}

impl std::fmt::Debug for Satchel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Satchel")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}
