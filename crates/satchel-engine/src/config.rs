use std::path::Path;

use satchel_types::Tier;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Engine settings. Every field has a default, so an empty TOML file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tier for new containers when the host names none, and for healing
    /// carriers whose declared tier is unusable.
    pub default_tier: Tier,
    /// Durability consumed by one sell batch on each container that sold.
    pub sell_wear: u32,
    /// Drop tracked ids from a holder's index when no carrier matches them.
    pub prune_stale_ids: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_tier: Tier::One,
            sell_wear: 1,
            prune_stale_ids: true,
        }
    }
}

impl EngineConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML text.
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    fn validate(&self) -> EngineResult<()> {
        if self.sell_wear == 0 {
            return Err(EngineError::Config("sell_wear must be at least 1".into()));
        }
        Ok(())
    }
}
