//! Client-side configuration: where the API lives and how often to poll.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Base URL of the details API (e.g. "http://127.0.0.1:8080")
    pub api_url: String,
    /// Delay between two polls of the same resource (default: 5000)
    pub poll_interval_ms: u64,
    /// Per-request timeout (default: 10000)
    pub request_timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            poll_interval_ms: 5000,
            request_timeout_ms: 10_000,
        }
    }
}

impl WatchConfig {
    /// Load from a YAML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
