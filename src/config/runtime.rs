use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the queue carrying fetch and confirmation completions
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Capacity of the queue carrying UI commands
    #[serde(default = "default_command_buffer_size")]
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: default_event_buffer_size(),
            command_buffer_size: default_command_buffer_size(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 || self.command_buffer_size == 0 {
            return Err(Error::InvalidConfig("runtime buffer sizes must be greater than 0".into()));
        }
        Ok(())
    }
}

fn default_event_buffer_size() -> usize {
    256
}
fn default_command_buffer_size() -> usize {
    64
}
