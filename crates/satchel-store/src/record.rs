use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};
use satchel_types::{ContainerId, ItemKey, Tier};

use crate::error::{StoreError, StoreResult};
use crate::price::PriceLookup;

/// Upper bound on the entry count of `whitelist`, `contents`, and the
/// reference table. The codec refuses anything larger.
pub const MAX_ENTRIES: usize = 4096;

/// Lifecycle state derived from durability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// Durability above zero. Eligible for batch selling.
    Active,
    /// Durability at zero. Still a passive bucket, never sold from.
    Broken,
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Broken => write!(f, "broken"),
        }
    }
}

/// Raw fields of a record, before invariant checks.
///
/// Used by decoders that assemble a record field by field. Convert with
/// [`ContainerRecord::from_parts`].
#[derive(Clone, Debug)]
pub struct RecordParts {
    pub id: ContainerId,
    pub tier: Tier,
    pub durability: u32,
    pub sell_enabled: bool,
    pub whitelist: IndexSet<ItemKey>,
    pub contents: IndexMap<ItemKey, u32>,
    pub reference_table: BTreeMap<u16, ItemKey>,
}

/// Decoded state of one container.
///
/// Fields are private: every mutation goes through a method that upholds the
/// capacity and durability invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerRecord {
    id: ContainerId,
    tier: Tier,
    durability: u32,
    sell_enabled: bool,
    whitelist: IndexSet<ItemKey>,
    contents: IndexMap<ItemKey, u32>,
    reference_table: BTreeMap<u16, ItemKey>,
}

impl ContainerRecord {
    /// Default record for a freshly created container of `tier`.
    pub fn new(id: ContainerId, tier: Tier) -> Self {
        Self {
            id,
            tier,
            durability: tier.max_durability(),
            sell_enabled: true,
            whitelist: IndexSet::new(),
            contents: IndexMap::new(),
            reference_table: BTreeMap::new(),
        }
    }

    /// Assemble a record from raw parts, rejecting any that break an invariant.
    pub fn from_parts(parts: RecordParts) -> StoreResult<Self> {
        let max = parts.tier.max_durability();
        if parts.durability > max {
            return Err(StoreError::InvalidState(format!(
                "durability {} above maximum {max}",
                parts.durability
            )));
        }
        for (what, len) in [
            ("whitelist", parts.whitelist.len()),
            ("contents", parts.contents.len()),
            ("reference table", parts.reference_table.len()),
        ] {
            if len > MAX_ENTRIES {
                return Err(StoreError::TooManyEntries { what, max: MAX_ENTRIES });
            }
        }
        if let Some((item, _)) = parts.contents.iter().find(|(_, count)| **count == 0) {
            return Err(StoreError::InvalidState(format!("empty stack for {item}")));
        }
        let total: u64 = parts.contents.values().map(|c| u64::from(*c)).sum();
        if total > parts.tier.capacity() {
            return Err(StoreError::InvalidState(format!(
                "total {total} above capacity {}",
                parts.tier.capacity()
            )));
        }
        Ok(Self {
            id: parts.id,
            tier: parts.tier,
            durability: parts.durability,
            sell_enabled: parts.sell_enabled,
            whitelist: parts.whitelist,
            contents: parts.contents,
            reference_table: parts.reference_table,
        })
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn durability(&self) -> u32 {
        self.durability
    }

    pub fn sell_enabled(&self) -> bool {
        self.sell_enabled
    }

    pub fn whitelist(&self) -> &IndexSet<ItemKey> {
        &self.whitelist
    }

    /// Stack counts in insertion order.
    pub fn contents(&self) -> &IndexMap<ItemKey, u32> {
        &self.contents
    }

    pub fn reference_table(&self) -> &BTreeMap<u16, ItemKey> {
        &self.reference_table
    }

    // ---------------------------------------------------------------
    // Derived queries
    // ---------------------------------------------------------------

    pub fn capacity(&self) -> u64 {
        self.tier.capacity()
    }

    pub fn max_durability(&self) -> u32 {
        self.tier.max_durability()
    }

    /// Sum of all stack counts.
    pub fn total_items(&self) -> u64 {
        self.contents.values().map(|c| u64::from(*c)).sum()
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.capacity().saturating_sub(self.total_items())
    }

    /// Fill level in percent, `0.0..=100.0`.
    pub fn fill_percentage(&self) -> f64 {
        self.total_items() as f64 * 100.0 / self.capacity() as f64
    }

    pub fn is_full(&self) -> bool {
        self.total_items() >= self.capacity()
    }

    pub fn is_broken(&self) -> bool {
        self.durability == 0
    }

    pub fn state(&self) -> ContainerState {
        if self.is_broken() {
            ContainerState::Broken
        } else {
            ContainerState::Active
        }
    }

    /// Units of `item` currently held.
    pub fn count_of(&self, item: &ItemKey) -> u32 {
        self.contents.get(item).copied().unwrap_or(0)
    }

    /// Whether the whitelist admits `item`. An empty whitelist admits all.
    pub fn accepts(&self, item: &ItemKey) -> bool {
        self.whitelist.is_empty() || self.whitelist.contains(item)
    }

    // ---------------------------------------------------------------
    // Stack operations
    // ---------------------------------------------------------------

    /// Add `qty` units of `item`, all or nothing.
    ///
    /// A new item is appended at the end of the insertion order.
    pub fn add_item(&mut self, item: &ItemKey, qty: u32) -> StoreResult<()> {
        if qty == 0 {
            return Err(StoreError::InvalidQuantity);
        }
        check_kind(item)?;
        if !self.accepts(item) {
            return Err(StoreError::NotWhitelisted(item.clone()));
        }
        let available = self.remaining_capacity();
        if u64::from(qty) > available {
            return Err(StoreError::CapacityExceeded {
                requested: u64::from(qty),
                available,
            });
        }
        if !self.contents.contains_key(item) && self.contents.len() >= MAX_ENTRIES {
            return Err(StoreError::TooManyEntries {
                what: "contents",
                max: MAX_ENTRIES,
            });
        }
        *self.contents.entry(item.clone()).or_insert(0) += qty;
        Ok(())
    }

    /// Remove up to `qty` units of `item`. Returns the amount removed.
    ///
    /// An entry that reaches zero is deleted; the relative order of the
    /// remaining entries is preserved.
    pub fn remove_item(&mut self, item: &ItemKey, qty: u32) -> u32 {
        let Some(count) = self.contents.get_mut(item) else {
            return 0;
        };
        let removed = qty.min(*count);
        *count -= removed;
        if *count == 0 {
            self.contents.shift_remove(item);
        }
        removed
    }

    /// Snapshot of the entries with a positive price.
    pub fn get_vendable<P: PriceLookup + ?Sized>(&self, prices: &P) -> IndexMap<ItemKey, u32> {
        self.contents
            .iter()
            .filter(|(item, _)| prices.is_vendable(item))
            .map(|(item, count)| (item.clone(), *count))
            .collect()
    }

    /// Remove exactly the entries [`get_vendable`](Self::get_vendable) selects
    /// for the same `prices`, returning them.
    pub fn clear_vendable<P: PriceLookup + ?Sized>(&mut self, prices: &P) -> IndexMap<ItemKey, u32> {
        let vendable = self.get_vendable(prices);
        for item in vendable.keys() {
            self.contents.shift_remove(item);
        }
        vendable
    }

    // ---------------------------------------------------------------
    // Durability
    // ---------------------------------------------------------------

    /// Wear the container by `amount`, saturating at zero.
    ///
    /// Returns `false` once durability is zero, `true` otherwise. Contents
    /// are never touched.
    pub fn use_durability(&mut self, amount: u32) -> bool {
        self.durability = self.durability.saturating_sub(amount);
        self.durability > 0
    }

    /// Restore full durability. The only way out of [`ContainerState::Broken`].
    pub fn repair(&mut self) {
        self.durability = self.max_durability();
    }

    // ---------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------

    pub fn set_sell_enabled(&mut self, enabled: bool) {
        self.sell_enabled = enabled;
    }

    /// Add `item` to the whitelist and intern it as a prototype. Returns
    /// `Ok(false)` if already present.
    pub fn allow(&mut self, item: ItemKey) -> StoreResult<bool> {
        check_kind(&item)?;
        if self.whitelist.contains(&item) {
            return Ok(false);
        }
        if self.whitelist.len() >= MAX_ENTRIES {
            return Err(StoreError::TooManyEntries {
                what: "whitelist",
                max: MAX_ENTRIES,
            });
        }
        self.intern(&item)?;
        self.whitelist.insert(item);
        Ok(true)
    }

    /// Remove `item` from the whitelist and release its prototype. Returns
    /// `true` if it was present.
    pub fn disallow(&mut self, item: &ItemKey) -> bool {
        if !self.whitelist.shift_remove(item) {
            return false;
        }
        self.reference_table.retain(|_, proto| proto != item);
        true
    }

    pub fn clear_whitelist(&mut self) {
        self.whitelist.clear();
        self.reference_table.clear();
    }

    /// Reference key of an interned prototype.
    pub fn reference_key(&self, item: &ItemKey) -> Option<u16> {
        self.reference_table
            .iter()
            .find(|(_, proto)| *proto == item)
            .map(|(key, _)| *key)
    }

    /// Reference-table key for `item`, assigning the lowest free key if the
    /// prototype is not yet interned.
    fn intern(&mut self, item: &ItemKey) -> StoreResult<u16> {
        if let Some(key) = self.reference_key(item) {
            return Ok(key);
        }
        let full = StoreError::TooManyEntries {
            what: "reference table",
            max: MAX_ENTRIES,
        };
        if self.reference_table.len() >= MAX_ENTRIES {
            return Err(full);
        }
        let key = (0..=u16::MAX)
            .find(|k| !self.reference_table.contains_key(k))
            .ok_or(full)?;
        self.reference_table.insert(key, item.clone());
        Ok(key)
    }
}

fn check_kind(item: &ItemKey) -> StoreResult<()> {
    if item.kind.is_empty() {
        return Err(StoreError::EmptyKind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stone() -> ItemKey {
        ItemKey::new("stone")
    }

    fn dirt() -> ItemKey {
        ItemKey::new("dirt")
    }

    fn record(tier: Tier) -> ContainerRecord {
        ContainerRecord::new(ContainerId::new(), tier)
    }

    #[test]
    fn new_record_defaults() {
        let r = record(Tier::Two);
        assert_eq!(r.durability(), Tier::Two.max_durability());
        assert!(r.sell_enabled());
        assert!(r.whitelist().is_empty());
        assert!(r.contents().is_empty());
        assert!(r.reference_table().is_empty());
        assert_eq!(r.state(), ContainerState::Active);
    }

    // -----------------------------------------------------------------------
    // add / remove
    // -----------------------------------------------------------------------

    #[test]
    fn add_rejects_overflow_atomically() {
        let mut r = record(Tier::One);
        assert_eq!(r.capacity(), 1000);
        r.add_item(&stone(), 500).unwrap();
        assert_eq!(r.total_items(), 500);

        let err = r.add_item(&stone(), 600).unwrap_err();
        assert_eq!(
            err,
            StoreError::CapacityExceeded {
                requested: 600,
                available: 500
            }
        );
        assert_eq!(r.total_items(), 500);
        assert_eq!(r.count_of(&stone()), 500);
    }

    #[test]
    fn add_exactly_to_capacity() {
        let mut r = record(Tier::One);
        r.add_item(&stone(), 1000).unwrap();
        assert!(r.is_full());
        assert_eq!(r.fill_percentage(), 100.0);
        assert!(r.add_item(&dirt(), 1).is_err());
    }

    #[test]
    fn add_zero_is_rejected() {
        let mut r = record(Tier::One);
        assert_eq!(r.add_item(&stone(), 0), Err(StoreError::InvalidQuantity));
        assert!(r.contents().is_empty());
    }

    #[test]
    fn whitelist_filters_adds() {
        let mut r = record(Tier::One);
        assert!(r.allow(stone()).unwrap());
        assert!(!r.allow(stone()).unwrap());

        r.add_item(&stone(), 5).unwrap();
        let err = r.add_item(&dirt(), 5).unwrap_err();
        assert!(matches!(err, StoreError::NotWhitelisted(_)));
        assert_eq!(r.count_of(&dirt()), 0);

        r.clear_whitelist();
        r.add_item(&dirt(), 5).unwrap();
        assert_eq!(r.total_items(), 10);
    }

    #[test]
    fn new_entries_append_in_insertion_order() {
        let mut r = record(Tier::One);
        r.add_item(&dirt(), 1).unwrap();
        r.add_item(&stone(), 1).unwrap();
        r.add_item(&dirt(), 1).unwrap();
        let order: Vec<&str> = r.contents().keys().map(|k| k.kind.as_str()).collect();
        assert_eq!(order, vec!["dirt", "stone"]);
    }

    #[test]
    fn remove_is_clamped_and_deletes_empty_entries() {
        let mut r = record(Tier::One);
        r.add_item(&stone(), 10).unwrap();
        r.add_item(&dirt(), 3).unwrap();

        assert_eq!(r.remove_item(&stone(), 4), 4);
        assert_eq!(r.count_of(&stone()), 6);

        assert_eq!(r.remove_item(&dirt(), 50), 3);
        assert!(!r.contents().contains_key(&dirt()));

        assert_eq!(r.remove_item(&ItemKey::new("missing"), 1), 0);
    }

    #[test]
    fn remove_preserves_order_of_survivors() {
        let mut r = record(Tier::One);
        for kind in ["a", "b", "c"] {
            r.add_item(&ItemKey::new(kind), 1).unwrap();
        }
        r.remove_item(&ItemKey::new("a"), 1);
        let order: Vec<&str> = r.contents().keys().map(|k| k.kind.as_str()).collect();
        assert_eq!(order, vec!["b", "c"]);
    }

    // -----------------------------------------------------------------------
    // vendable
    // -----------------------------------------------------------------------

    #[test]
    fn vendable_snapshot_and_clear() {
        let prices = |item: &ItemKey| if item.kind == "stone" { 2 } else { 0 };
        let mut r = record(Tier::One);
        r.add_item(&stone(), 100).unwrap();
        r.add_item(&dirt(), 7).unwrap();

        let snapshot = r.get_vendable(&prices);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&stone()), Some(&100));
        // Snapshot is read-only.
        assert_eq!(r.count_of(&stone()), 100);

        let cleared = r.clear_vendable(&prices);
        assert_eq!(cleared, snapshot);
        assert_eq!(r.count_of(&stone()), 0);
        assert_eq!(r.count_of(&dirt()), 7);
    }

    // -----------------------------------------------------------------------
    // durability
    // -----------------------------------------------------------------------

    #[test]
    fn durability_break_transition() {
        let mut r = record(Tier::One);
        let max = r.max_durability();
        assert!(r.use_durability(max - 1));
        assert_eq!(r.durability(), 1);
        assert!(!r.use_durability(1));
        assert!(r.is_broken());
        assert_eq!(r.state(), ContainerState::Broken);

        // Stays broken; saturates at zero.
        assert!(!r.use_durability(5));
        assert_eq!(r.durability(), 0);
    }

    #[test]
    fn broken_record_is_still_a_bucket() {
        let mut r = record(Tier::One);
        r.use_durability(u32::MAX);
        r.add_item(&stone(), 3).unwrap();
        assert_eq!(r.remove_item(&stone(), 3), 3);
    }

    #[test]
    fn durability_does_not_touch_contents() {
        let mut r = record(Tier::One);
        r.add_item(&stone(), 3).unwrap();
        r.use_durability(u32::MAX);
        assert_eq!(r.count_of(&stone()), 3);
    }

    #[test]
    fn repair_restores_active() {
        let mut r = record(Tier::Three);
        r.use_durability(u32::MAX);
        r.repair();
        assert_eq!(r.durability(), Tier::Three.max_durability());
        assert_eq!(r.state(), ContainerState::Active);
    }

    // -----------------------------------------------------------------------
    // reference table
    // -----------------------------------------------------------------------

    #[test]
    fn whitelist_entries_are_interned_once() {
        let mut r = record(Tier::One);
        r.allow(stone()).unwrap();
        r.allow(dirt()).unwrap();
        r.allow(stone()).unwrap();
        assert_eq!(r.reference_key(&stone()), Some(0));
        assert_eq!(r.reference_key(&dirt()), Some(1));
        assert_eq!(r.reference_table().len(), 2);
    }

    #[test]
    fn released_keys_are_reused() {
        let mut r = record(Tier::One);
        r.allow(stone()).unwrap();
        r.allow(dirt()).unwrap();
        assert!(r.disallow(&stone()));
        assert_eq!(r.reference_key(&stone()), None);

        r.allow(ItemKey::new("gold")).unwrap();
        assert_eq!(r.reference_key(&ItemKey::new("gold")), Some(0));

        r.clear_whitelist();
        assert!(r.reference_table().is_empty());
    }

    // -----------------------------------------------------------------------
    // entry bounds
    // -----------------------------------------------------------------------

    #[test]
    fn contents_stop_at_entry_bound() {
        let mut r = record(Tier::Five);
        for i in 0..MAX_ENTRIES {
            r.add_item(&ItemKey::new(format!("k{i}")), 1).unwrap();
        }
        let before = r.clone();
        let err = r.add_item(&ItemKey::new("one-too-many"), 1).unwrap_err();
        assert_eq!(
            err,
            StoreError::TooManyEntries {
                what: "contents",
                max: MAX_ENTRIES
            }
        );
        assert_eq!(r, before);

        // Existing stacks still grow.
        r.add_item(&ItemKey::new("k0"), 5).unwrap();
        assert_eq!(r.count_of(&ItemKey::new("k0")), 6);
    }

    #[test]
    fn whitelist_stops_at_entry_bound() {
        let mut r = record(Tier::One);
        for i in 0..MAX_ENTRIES {
            r.allow(ItemKey::new(format!("w{i}"))).unwrap();
        }
        let before = r.clone();
        assert!(matches!(
            r.allow(ItemKey::new("one-too-many")),
            Err(StoreError::TooManyEntries { what: "whitelist", .. })
        ));
        assert_eq!(r, before);
        assert_eq!(r.allow(ItemKey::new("w0")), Ok(false));
    }

    #[test]
    fn empty_kind_is_rejected() {
        let mut r = record(Tier::One);
        assert_eq!(r.add_item(&ItemKey::new(""), 1), Err(StoreError::EmptyKind));
        assert_eq!(r.allow(ItemKey::new("")), Err(StoreError::EmptyKind));
        assert!(r.contents().is_empty());
        assert!(r.whitelist().is_empty());
        assert!(r.reference_table().is_empty());
    }

    // -----------------------------------------------------------------------
    // from_parts
    // -----------------------------------------------------------------------

    fn parts() -> RecordParts {
        RecordParts {
            id: ContainerId::new(),
            tier: Tier::One,
            durability: 10,
            sell_enabled: false,
            whitelist: IndexSet::new(),
            contents: IndexMap::new(),
            reference_table: BTreeMap::new(),
        }
    }

    #[test]
    fn from_parts_accepts_valid() {
        let mut p = parts();
        p.contents.insert(stone(), 5);
        let r = ContainerRecord::from_parts(p).unwrap();
        assert_eq!(r.durability(), 10);
        assert!(!r.sell_enabled());
        assert_eq!(r.count_of(&stone()), 5);
    }

    #[test]
    fn from_parts_rejects_invariant_violations() {
        let mut p = parts();
        p.durability = Tier::One.max_durability() + 1;
        assert!(matches!(ContainerRecord::from_parts(p), Err(StoreError::InvalidState(_))));

        let mut p = parts();
        p.contents.insert(stone(), 0);
        assert!(ContainerRecord::from_parts(p).is_err());

        let mut p = parts();
        p.contents.insert(stone(), 1001);
        assert!(ContainerRecord::from_parts(p).is_err());

        let mut p = parts();
        for i in 0..=MAX_ENTRIES {
            p.whitelist.insert(ItemKey::new(format!("w{i}")));
        }
        assert!(matches!(
            ContainerRecord::from_parts(p),
            Err(StoreError::TooManyEntries { what: "whitelist", .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Capacity invariant under arbitrary operation sequences
    // -----------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u32),
        Remove(u8, u32),
        Wear(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u32..700).prop_map(|(k, q)| Op::Add(k, q)),
            (0u8..4, 0u32..700).prop_map(|(k, q)| Op::Remove(k, q)),
            (0u32..40).prop_map(Op::Wear),
        ]
    }

    proptest! {
        #[test]
        fn capacity_and_durability_invariants_hold(ops in proptest::collection::vec(op(), 0..64)) {
            let mut r = record(Tier::One);
            let mut last_durability = r.durability();
            for op in ops {
                let before = r.clone();
                match op {
                    Op::Add(k, q) => {
                        if r.add_item(&ItemKey::new(format!("k{k}")), q).is_err() {
                            prop_assert_eq!(&r, &before);
                        }
                    }
                    Op::Remove(k, q) => {
                        r.remove_item(&ItemKey::new(format!("k{k}")), q);
                    }
                    Op::Wear(n) => {
                        r.use_durability(n);
                    }
                }
                prop_assert!(r.total_items() <= r.capacity());
                prop_assert!(r.durability() <= last_durability);
                prop_assert!(r.contents().values().all(|c| *c > 0));
                last_durability = r.durability();
            }
        }
    }
}
