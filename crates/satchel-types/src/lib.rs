//! Foundation types for Satchel.
//!
//! Every other Satchel crate depends on `satchel-types`. Nothing here knows
//! about encoding, caching, or carriers; these are plain value types.
//!
//! # Key Types
//!
//! - [`ContainerId`]: Immutable identity assigned to a container at creation
//! - [`HolderId`]: Identity of the actor whose scope holds carriers
//! - [`ItemKey`]: Comparison-sensitive item identity used as a map key
//! - [`Tier`]: Ordinal class fixing capacity and maximum durability

pub mod error;
pub mod identity;
pub mod item;
pub mod tier;

pub use error::TypeError;
pub use identity::{ContainerId, HolderId};
pub use item::ItemKey;
pub use tier::Tier;
