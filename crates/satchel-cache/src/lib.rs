//! Cache and coherency layer.
//!
//! [`ContainerCache`] maps container ids to decoded records and is the single
//! authority over record state. A carrier's blob is only a durable mirror:
//! once an id is cached, the blob is never read again until the entry is
//! evicted. [`ContainerCache::persist`] is the only code path that writes the
//! four carrier fields.
//!
//! # Design Rules
//!
//! 1. A cached record wins over the carrier's bytes.
//! 2. Every mutation is followed by a persist before the carrier leaves
//!    tracked scope.
//! 3. A corrupt payload is healed in place, never reported to the caller.
//! 4. The holder index is a recovery aid; `rescan` rebuilds it from scratch.
//! 5. Map access goes through atomic entry operations; no check-then-act.

pub mod cache;
pub mod carrier;
pub mod error;
pub mod holder;
pub mod render;

pub use cache::ContainerCache;
pub use carrier::{Carrier, InMemoryCarrier};
pub use error::{CacheError, CacheResult};
pub use holder::{Holder, InMemoryHolder};
pub use render::{NoOpRenderer, RecordRenderer};
