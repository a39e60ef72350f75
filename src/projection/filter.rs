use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::Severity;
use crate::StoredNotification;

/// Which entries a surface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionFilter {
    #[default]
    All,
    Unread,
    Severity(Severity),
}

impl ProjectionFilter {
    pub fn matches(
        &self,
        entry: &StoredNotification,
        include_unconfirmed: bool,
    ) -> bool {
        match self {
            ProjectionFilter::All => true,
            ProjectionFilter::Unread => !entry.visible_read(include_unconfirmed),
            ProjectionFilter::Severity(severity) => entry.notification.severity == *severity,
        }
    }
}

impl FromStr for ProjectionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ProjectionFilter::All),
            "unread" => Ok(ProjectionFilter::Unread),
            other => other
                .parse::<Severity>()
                .map(ProjectionFilter::Severity)
                .map_err(|_| format!("unknown projection filter '{s}'")),
        }
    }
}

impl TryFrom<String> for ProjectionFilter {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ProjectionFilter> for String {
    fn from(filter: ProjectionFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for ProjectionFilter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ProjectionFilter::All => f.write_str("all"),
            ProjectionFilter::Unread => f.write_str("unread"),
            ProjectionFilter::Severity(severity) => f.write_str(severity.as_str()),
        }
    }
}
