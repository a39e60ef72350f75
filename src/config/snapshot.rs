use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SnapshotConfig {
    /// Upper bound on the page requested at activation. The effective limit is
    /// the largest registered projection capacity, clamped to this value.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Deadline for snapshot and stats requests (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl SnapshotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(Error::InvalidConfig("snapshot.max_page_size must be greater than 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "snapshot.request_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_page_size() -> usize {
    100
}
fn default_request_timeout_ms() -> u64 {
    5000
}
