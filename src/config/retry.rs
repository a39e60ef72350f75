use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (1 means no retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single operation timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_op_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::InvalidConfig("max_retries must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("timeout_ms must be greater than 0".into()));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "base_delay_ms {} exceeds max_delay_ms {}",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

fn default_max_retries() -> usize {
    2
}
fn default_op_timeout_ms() -> u64 {
    3000
}
fn default_base_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    2000
}
