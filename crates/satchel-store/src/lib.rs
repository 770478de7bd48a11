//! In-memory aggregate operations over one container record.
//!
//! A [`ContainerRecord`] is the decoded state of a single container: its
//! tier, durability, sell toggle, whitelist, and insertion-ordered stack
//! counts. Every mutation here is pure in-memory computation; encoding and
//! write-back to a carrier belong to `satchel-codec` and `satchel-cache`.
//!
//! # Rules
//!
//! 1. `total_items() <= capacity()` holds in every reachable state.
//! 2. A failing mutation changes nothing (all-or-nothing).
//! 3. Durability only goes down, except through [`ContainerRecord::repair`].
//! 4. `contents` iterates in insertion order; drains are deterministic.
//! 5. No collection grows past [`MAX_ENTRIES`], so every reachable record
//!    encodes.

pub mod error;
pub mod price;
pub mod record;

pub use error::{StoreError, StoreResult};
pub use price::PriceLookup;
pub use record::{ContainerRecord, ContainerState, RecordParts, MAX_ENTRIES};
