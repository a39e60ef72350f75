//! Configuration management for the notification engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`NOTIFY__` prefix)
//! - Component-wise validation
mod alerts;
mod projection;
mod read_state;
mod retry;
mod runtime;
mod snapshot;
pub use alerts::*;
pub use projection::*;
pub use read_state::*;
pub use retry::*;
pub use runtime::*;
pub use snapshot::*;

#[cfg(test)]
mod config_test;

use std::collections::HashSet;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Main configuration container for the notification engine
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Initial page retrieval
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Read confirmation behaviour
    #[serde(default)]
    pub read_state: ReadStateConfig,
    /// Ephemeral alert dwell times
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Live-only activity feed
    #[serde(default)]
    pub feed: FeedConfig,
    /// Named UI surfaces served by a snapshot-backed engine
    #[serde(default = "default_projections")]
    pub projections: Vec<ProjectionConfig>,
    /// Internal queue sizing
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig::default(),
            read_state: ReadStateConfig::default(),
            alerts: AlertConfig::default(),
            feed: FeedConfig::default(),
            projections: default_projections(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `NOTIFY__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred to allow further overrides via `with_override_config()`.
    /// Callers MUST call `validate()` before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("NOTIFY__FEED__CAPACITY", "100");
    /// let cfg = EngineConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// Returns validation errors from any subsystem:
    /// - Zero capacities or buffer sizes
    /// - Medium alerts dwelling longer than high alerts
    /// - Duplicate projection names
    pub fn validate(self) -> Result<Self> {
        self.snapshot.validate()?;
        self.read_state.validate()?;
        self.alerts.validate()?;
        self.feed.validate()?;
        self.runtime.validate()?;

        let mut names = HashSet::new();
        for projection in &self.projections {
            projection.validate()?;
            if !names.insert(projection.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "projection name '{}' is used more than once",
                    projection.name
                )));
            }
        }
        Ok(self)
    }

    pub fn projection(
        &self,
        name: &str,
    ) -> Option<&ProjectionConfig> {
        self.projections.iter().find(|p| p.name == name)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("NOTIFY")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
