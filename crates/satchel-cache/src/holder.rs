use satchel_types::HolderId;

use crate::carrier::{Carrier, InMemoryCarrier};

/// An actor whose scope holds zero or more carriers.
pub trait Holder {
    fn holder_id(&self) -> HolderId;

    /// Every carrier currently in the holder's scope, containers or not.
    fn carriers_mut(&mut self) -> Vec<&mut dyn Carrier>;
}

/// Holder backed by a plain `Vec` of carriers.
#[derive(Clone, Debug)]
pub struct InMemoryHolder {
    pub id: HolderId,
    pub carriers: Vec<InMemoryCarrier>,
}

impl InMemoryHolder {
    pub fn new(id: HolderId) -> Self {
        Self {
            id,
            carriers: Vec::new(),
        }
    }

    /// Add a carrier and return its slot index.
    pub fn push(&mut self, carrier: InMemoryCarrier) -> usize {
        self.carriers.push(carrier);
        self.carriers.len() - 1
    }
}

impl Holder for InMemoryHolder {
    fn holder_id(&self) -> HolderId {
        self.id
    }

    fn carriers_mut(&mut self) -> Vec<&mut dyn Carrier> {
        self.carriers
            .iter_mut()
            .map(|c| c as &mut dyn Carrier)
            .collect()
    }
}
