//! Sell/transfer engine and lifecycle adapter.
//!
//! [`Satchel`] is the entry point for hosts: it owns the cache, applies
//! [`EngineConfig`], runs batch drains, and hands out a [`Lifecycle`] adapter
//! that maps host events onto cache operations.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod satchel;
pub mod sell;
pub mod transfer;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use lifecycle::Lifecycle;
pub use satchel::Satchel;
pub use sell::{BreakNotice, SellReport, SoldLine};
pub use transfer::{transfer_to_holder, ItemSink};

// Re-export key types
pub use satchel_cache::{Carrier, ContainerCache, Holder, InMemoryCarrier, InMemoryHolder, RecordRenderer};
pub use satchel_store::{ContainerRecord, ContainerState, PriceLookup};
pub use satchel_types::{ContainerId, HolderId, ItemKey, Tier};
