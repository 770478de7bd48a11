use indexmap::IndexMap;
use satchel_store::{ContainerRecord, PriceLookup};
use satchel_types::{ContainerId, ItemKey, Tier};

/// Units sold and value earned for one item identity across a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoldLine {
    pub count: u64,
    pub value: u64,
}

/// A container that broke during a sell batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakNotice {
    pub id: ContainerId,
    pub tier: Tier,
}

/// Outcome of one `sell_all` batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SellReport {
    /// Sum of `price * count` over everything removed.
    pub total_value: u64,
    /// Per-identity totals, in first-sold order.
    pub per_item: IndexMap<ItemKey, SoldLine>,
    /// Containers whose durability hit zero during this batch.
    pub breaks: Vec<BreakNotice>,
    /// Containers that sold at least one unit.
    pub containers_sold: usize,
    /// Containers whose sale stands in the cache but could not be written
    /// back to their carrier.
    pub persist_failures: Vec<ContainerId>,
}

impl SellReport {
    /// Total units sold across all identities.
    pub fn units_sold(&self) -> u64 {
        self.per_item.values().map(|line| line.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.per_item.is_empty()
    }

    pub(crate) fn absorb(&mut self, sale: RecordSale) {
        self.total_value = self.total_value.saturating_add(sale.value);
        for (item, line) in sale.lines {
            let total = self.per_item.entry(item).or_default();
            total.count += line.count;
            total.value = total.value.saturating_add(line.value);
        }
        if let Some(notice) = sale.broke {
            self.breaks.push(notice);
        }
        self.containers_sold += 1;
    }
}

/// What one container contributed to a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordSale {
    pub value: u64,
    pub lines: IndexMap<ItemKey, SoldLine>,
    pub broke: Option<BreakNotice>,
}

/// Whether a record takes part in batch selling at all.
pub(crate) fn is_eligible(record: &ContainerRecord) -> bool {
    record.sell_enabled() && !record.is_broken()
}

/// Sell every vendable stack in `record` and wear it by `wear`.
///
/// Returns `None`, leaving the record untouched, when the record is broken,
/// has selling disabled, or holds nothing vendable.
pub(crate) fn sell_record<P: PriceLookup + ?Sized>(
    record: &mut ContainerRecord,
    prices: &P,
    wear: u32,
) -> Option<RecordSale> {
    if !is_eligible(record) || record.get_vendable(prices).is_empty() {
        return None;
    }

    let sold = record.clear_vendable(prices);
    let mut value = 0u64;
    let mut lines = IndexMap::with_capacity(sold.len());
    for (item, count) in sold {
        let line_value = prices.price(&item).saturating_mul(u64::from(count));
        value = value.saturating_add(line_value);
        lines.insert(
            item,
            SoldLine {
                count: u64::from(count),
                value: line_value,
            },
        );
    }

    let broke = (!record.use_durability(wear)).then(|| BreakNotice {
        id: record.id(),
        tier: record.tier(),
    });

    Some(RecordSale {
        value,
        lines,
        broke,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(item: &ItemKey) -> u64 {
        match item.kind.as_str() {
            "stone" => 2,
            "gold" => 50,
            _ => 0,
        }
    }

    fn record() -> ContainerRecord {
        ContainerRecord::new(ContainerId::new(), Tier::One)
    }

    #[test]
    fn sells_priced_stacks_and_wears_once() {
        let mut r = record();
        r.add_item(&ItemKey::new("stone"), 100).unwrap();
        let before = r.durability();

        let sale = sell_record(&mut r, &prices, 1).unwrap();
        assert_eq!(sale.value, 200);
        assert!(r.contents().is_empty());
        assert_eq!(r.durability(), before - 1);
        assert!(sale.broke.is_none());
    }

    #[test]
    fn unpriced_stacks_are_untouched() {
        let mut r = record();
        r.add_item(&ItemKey::new("gold"), 3).unwrap();
        r.add_item(&ItemKey::new("dirt"), 9).unwrap();

        let sale = sell_record(&mut r, &prices, 1).unwrap();
        assert_eq!(sale.value, 150);
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(r.count_of(&ItemKey::new("dirt")), 9);
    }

    #[test]
    fn value_matches_removed_entries() {
        let mut r = record();
        r.add_item(&ItemKey::new("stone"), 13).unwrap();
        r.add_item(&ItemKey::new("gold"), 4).unwrap();
        r.add_item(&ItemKey::new("dirt"), 1).unwrap();
        let vendable = r.get_vendable(&prices);

        let sale = sell_record(&mut r, &prices, 1).unwrap();
        let expected: u64 = vendable.iter().map(|(i, c)| prices(i) * u64::from(*c)).sum();
        assert_eq!(sale.value, expected);
    }

    #[test]
    fn skips_ineligible_records() {
        let mut disabled = record();
        disabled.add_item(&ItemKey::new("stone"), 1).unwrap();
        disabled.set_sell_enabled(false);
        assert!(sell_record(&mut disabled, &prices, 1).is_none());
        assert_eq!(disabled.count_of(&ItemKey::new("stone")), 1);

        let mut broken = record();
        broken.add_item(&ItemKey::new("stone"), 1).unwrap();
        broken.use_durability(u32::MAX);
        assert!(sell_record(&mut broken, &prices, 1).is_none());
        assert_eq!(broken.count_of(&ItemKey::new("stone")), 1);
    }

    #[test]
    fn nothing_vendable_means_no_wear() {
        let mut r = record();
        r.add_item(&ItemKey::new("dirt"), 1).unwrap();
        let before = r.durability();
        assert!(sell_record(&mut r, &prices, 1).is_none());
        assert_eq!(r.durability(), before);
    }

    #[test]
    fn last_durability_point_reports_break() {
        let mut r = record();
        r.use_durability(r.max_durability() - 1);
        r.add_item(&ItemKey::new("stone"), 1).unwrap();
        let sale = sell_record(&mut r, &prices, 1).unwrap();
        assert_eq!(
            sale.broke,
            Some(BreakNotice {
                id: r.id(),
                tier: Tier::One
            })
        );
        assert!(r.is_broken());
    }

    #[test]
    fn report_merges_lines_across_records() {
        let mut report = SellReport::default();
        for _ in 0..2 {
            let mut r = record();
            r.add_item(&ItemKey::new("stone"), 10).unwrap();
            report.absorb(sell_record(&mut r, &prices, 1).unwrap());
        }
        assert_eq!(report.total_value, 40);
        assert_eq!(report.units_sold(), 20);
        assert_eq!(report.containers_sold, 2);
        assert_eq!(
            report.per_item.get(&ItemKey::new("stone")),
            Some(&SoldLine { count: 20, value: 40 })
        );
    }
}
