use satchel_store::ContainerRecord;
use satchel_types::ItemKey;

/// A bounded destination for drained items, e.g. a holder's own inventory.
pub trait ItemSink {
    /// Offer `count` units of `item`; return how many were accepted.
    ///
    /// Accepting fewer than offered means the sink is full.
    fn try_add(&mut self, item: &ItemKey, count: u32) -> u32;
}

impl<F> ItemSink for F
where
    F: FnMut(&ItemKey, u32) -> u32,
{
    fn try_add(&mut self, item: &ItemKey, count: u32) -> u32 {
        self(item, count)
    }
}

/// Drain `record` into `sink` in insertion order.
///
/// Only accepted units leave the record. Draining stops at the first entry
/// the sink does not take in full; the record keeps everything not accepted.
/// Returns the number of units moved.
pub fn transfer_to_holder<S: ItemSink + ?Sized>(record: &mut ContainerRecord, sink: &mut S) -> u64 {
    let entries: Vec<(ItemKey, u32)> = record
        .contents()
        .iter()
        .map(|(item, count)| (item.clone(), *count))
        .collect();

    let mut transferred = 0u64;
    for (item, count) in entries {
        // A sink claiming more than offered cannot create units.
        let accepted = sink.try_add(&item, count).min(count);
        if accepted > 0 {
            transferred += u64::from(record.remove_item(&item, accepted));
        }
        if accepted < count {
            break;
        }
    }
    transferred
}
