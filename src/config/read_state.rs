use serde::Deserialize;
use serde::Serialize;

use super::BackoffPolicy;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReadStateConfig {
    /// Confirmations in flight at once during `mark_all_read`
    #[serde(default = "default_confirm_concurrency")]
    pub confirm_concurrency: usize,

    /// Timeout and retry policy for each `confirm_read` request
    #[serde(default)]
    pub confirm: BackoffPolicy,
}

impl Default for ReadStateConfig {
    fn default() -> Self {
        Self {
            confirm_concurrency: default_confirm_concurrency(),
            confirm: BackoffPolicy::default(),
        }
    }
}

impl ReadStateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.confirm_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "read_state.confirm_concurrency must be greater than 0".into(),
            ));
        }
        self.confirm.validate()
    }
}

fn default_confirm_concurrency() -> usize {
    4
}
