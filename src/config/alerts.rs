use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlertConfig {
    /// Raise alerts for live arrivals at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How long a high severity alert stays on screen (milliseconds)
    #[serde(default = "default_high_dwell_ms")]
    pub high_dwell_ms: u64,

    /// How long a medium severity alert stays on screen (milliseconds)
    #[serde(default = "default_medium_dwell_ms")]
    pub medium_dwell_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            high_dwell_ms: default_high_dwell_ms(),
            medium_dwell_ms: default_medium_dwell_ms(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.high_dwell_ms == 0 || self.medium_dwell_ms == 0 {
            return Err(Error::InvalidConfig("alert dwell times must be greater than 0".into()));
        }
        if self.medium_dwell_ms > self.high_dwell_ms {
            return Err(Error::InvalidConfig(format!(
                "medium_dwell_ms {} exceeds high_dwell_ms {}",
                self.medium_dwell_ms, self.high_dwell_ms
            )));
        }
        Ok(())
    }

    pub fn high_dwell(&self) -> Duration {
        Duration::from_millis(self.high_dwell_ms)
    }

    pub fn medium_dwell(&self) -> Duration {
        Duration::from_millis(self.medium_dwell_ms)
    }
}

fn default_enabled() -> bool {
    true
}
fn default_high_dwell_ms() -> u64 {
    8000
}
fn default_medium_dwell_ms() -> u64 {
    5000
}
