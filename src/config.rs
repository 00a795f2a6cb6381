use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_DELETE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_SEARCH_DELAY_MS,
};
use crate::error::ConfigError;

/// Immutable pacing and retry settings for clearance runs.
///
/// Loaded from an optional YAML file; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClearanceConfig {
    pub search_delay_ms: u64,
    pub delete_delay_ms: u64,
    pub max_attempts: u32,
    /// Consecutive throttled responses tolerated for one history page
    /// before discovery gives up. `None` retries forever.
    pub search_throttle_retry_cap: Option<u32>,
    pub api_base: String,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            search_delay_ms: DEFAULT_SEARCH_DELAY_MS,
            delete_delay_ms: DEFAULT_DELETE_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            search_throttle_retry_cap: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ClearanceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_attempts".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api_base".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }
}
