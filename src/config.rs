//! Engine configuration.
//!
//! Plain serde-derived structs with defaults, loadable from JSON. The engine
//! takes a fully built `EngineConfig`; where the file lives and when it is
//! read is the embedding application's concern.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Top-level configuration for the address resolution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Debounce and delivery settings for query dispatchers.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Location index cache settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Maximum suggestions delivered per query.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

/// Debounce windows per field flavor. Customer-name fields settle faster
/// than free-form address fields in practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Debounce window for customer-address fields, in milliseconds.
    #[serde(default = "default_customer_debounce_ms")]
    pub customer_debounce_ms: u64,

    /// Debounce window for location fields, in milliseconds.
    #[serde(default = "default_location_debounce_ms")]
    pub location_debounce_ms: u64,
}

/// Location index cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Seconds a built index snapshot stays fresh before the next read
    /// triggers a rebuild.
    #[serde(default = "default_index_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_suggestions() -> usize {
    8
}

fn default_customer_debounce_ms() -> u64 {
    150
}

fn default_location_debounce_ms() -> u64 {
    300
}

fn default_index_ttl_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            index: IndexConfig::default(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            customer_debounce_ms: default_customer_debounce_ms(),
            location_debounce_ms: default_location_debounce_ms(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_index_ttl_secs(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_suggestions == 0 {
            return Err(EngineError::Config(
                "max_suggestions must be at least 1".to_string(),
            ));
        }
        if self.dispatch.customer_debounce_ms == 0 || self.dispatch.location_debounce_ms == 0 {
            return Err(EngineError::Config(
                "debounce windows must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index.ttl_secs)
    }
}

impl DispatchConfig {
    pub fn customer_debounce(&self) -> Duration {
        Duration::from_millis(self.customer_debounce_ms)
    }

    pub fn location_debounce(&self) -> Duration {
        Duration::from_millis(self.location_debounce_ms)
    }
}
