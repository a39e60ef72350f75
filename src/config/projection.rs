use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::ProjectionFilter;
use crate::Result;

pub const BELL_DROPDOWN: &str = "bell";
pub const NOTIFICATION_LIST: &str = "list";
pub const LIVE_FEED: &str = "feed";

/// One UI surface's view over the shared store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub name: String,

    /// Maximum number of entries in the view
    pub capacity: usize,

    #[serde(default)]
    pub filter: ProjectionFilter,

    /// Show optimistic read marks before the server confirms them
    #[serde(default = "default_include_unconfirmed")]
    pub include_unconfirmed: bool,
}

impl ProjectionConfig {
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            name: name.into(),
            capacity,
            filter: ProjectionFilter::All,
            include_unconfirmed: default_include_unconfirmed(),
        }
    }

    pub fn with_filter(
        mut self,
        filter: ProjectionFilter,
    ) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_include_unconfirmed(
        mut self,
        include: bool,
    ) -> Self {
        self.include_unconfirmed = include;
        self
    }

    /// Compact dropdown next to the bell icon
    pub fn bell_dropdown() -> Self {
        Self::new(BELL_DROPDOWN, 20)
    }

    /// Full notification page
    pub fn notification_list() -> Self {
        Self::new(NOTIFICATION_LIST, 50)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("projection name cannot be empty".into()));
        }
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(format!(
                "projection '{}' capacity must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Live-only activity feed bounded at ingestion time
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_capacity")]
    pub capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_feed_capacity(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("feed.capacity must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn projection(&self) -> ProjectionConfig {
        ProjectionConfig::new(LIVE_FEED, self.capacity)
    }
}

pub(super) fn default_projections() -> Vec<ProjectionConfig> {
    vec![ProjectionConfig::bell_dropdown(), ProjectionConfig::notification_list()]
}

fn default_include_unconfirmed() -> bool {
    true
}
fn default_feed_capacity() -> usize {
    50
}
