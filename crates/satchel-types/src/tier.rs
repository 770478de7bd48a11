use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Ordinal container class. Fixes base capacity and maximum durability.
///
/// Serialized as its 1-based ordinal, the same integer a carrier stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Tier {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 5] = [Tier::One, Tier::Two, Tier::Three, Tier::Four, Tier::Five];

    /// Parse from the integer stored on a carrier.
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            _ => None,
        }
    }

    /// The 1-based ordinal.
    pub fn ordinal(&self) -> i32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Maximum total item count a container of this tier may hold.
    pub fn capacity(&self) -> u64 {
        match self {
            Self::One => 1_000,
            Self::Two => 2_500,
            Self::Three => 5_000,
            Self::Four => 10_000,
            Self::Five => 25_000,
        }
    }

    /// Durability of a freshly created or repaired container.
    pub fn max_durability(&self) -> u32 {
        match self {
            Self::One => 100,
            Self::Two => 250,
            Self::Three => 500,
            Self::Four => 1_000,
            Self::Five => 2_500,
        }
    }
}

impl TryFrom<i32> for Tier {
    type Error = TypeError;

    fn try_from(ordinal: i32) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal).ok_or(TypeError::UnknownTier(ordinal))
    }
}

impl From<Tier> for i32 {
    fn from(tier: Tier) -> Self {
        tier.ordinal()
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::One
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.ordinal())
    }
}
