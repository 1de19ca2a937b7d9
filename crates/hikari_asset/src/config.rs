use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::AssetError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub hot_reload: bool,
    /// Minimum time between two scans of the file system
    pub hot_reload_interval_ms: u64,
    /// Longest single wait of `load_sync` before it rechecks the record
    pub sync_poll_interval_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            hot_reload: true,
            hot_reload_interval_ms: 500,
            sync_poll_interval_ms: 5,
        }
    }
}

impl AssetConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, AssetError> {
        Ok(serde_yaml::from_str(text)?)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
    pub fn hot_reload_interval(&self) -> Duration {
        Duration::from_millis(self.hot_reload_interval_ms)
    }
    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync_poll_interval_ms.max(1))
    }
}
