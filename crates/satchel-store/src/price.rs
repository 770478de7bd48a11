use satchel_types::ItemKey;

/// Price collaborator: what one unit of an item sells for.
///
/// Amounts are integer minor currency units. `0` means "not sellable".
pub trait PriceLookup {
    fn price(&self, item: &ItemKey) -> u64;

    /// Returns `true` if the item has a positive price.
    fn is_vendable(&self, item: &ItemKey) -> bool {
        self.price(item) > 0
    }
}

impl<F> PriceLookup for F
where
    F: Fn(&ItemKey) -> u64,
{
    fn price(&self, item: &ItemKey) -> u64 {
        self(item)
    }
}
