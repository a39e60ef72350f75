use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Severity;

const BADGE_LIMIT: u64 = 99;

/// Aggregate counters shown next to the notification surfaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub severity_counts: BTreeMap<Severity, u64>,
}

impl Stats {
    pub fn severity_count(
        &self,
        severity: Severity,
    ) -> u64 {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// Text for the unread badge; `None` when nothing is unread
    pub fn unread_badge(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            n if n > BADGE_LIMIT => Some(format!("{BADGE_LIMIT}+")),
            n => Some(n.to_string()),
        }
    }
}
