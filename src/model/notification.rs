use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Opaque notification identifier.
///
/// Servers emit either numeric or string ids; both are normalized to their
/// string form so the same logical event compares equal regardless of the
/// delivery path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct NotificationId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for NotificationId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => NotificationId(n.to_string()),
            RawId::Text(s) => NotificationId(s),
        }
    }
}

impl From<NotificationId> for String {
    fn from(id: NotificationId) -> Self {
        id.0
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        NotificationId(s.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(s: String) -> Self {
        NotificationId(s)
    }
}

impl From<u64> for NotificationId {
    fn from(n: u64) -> Self {
        NotificationId(n.to_string())
    }
}

impl NotificationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum NotificationType {
    ThreatAnalyzed,
    NewThreat,
    SystemAlert,
    Other,
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "threat_analyzed" => NotificationType::ThreatAnalyzed,
            "new_threat" => NotificationType::NewThreat,
            "system_alert" => NotificationType::SystemAlert,
            _ => NotificationType::Other,
        }
    }
}

/// Urgency classification.
///
/// Variant order defines the alerting order: `High > Medium > Low > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

// Anything unrecognized is displayed and counted as informational.
impl From<String> for Severity {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Severity::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar metadata value attached to a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    pub fn new(
        id: impl Into<NotificationId>,
        kind: NotificationType,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: String::new(),
            severity,
            user_id: "system".to_string(),
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
            is_read: false,
        }
    }

    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_user(
        mut self,
        user_id: impl Into<String>,
    ) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_timestamp(
        mut self,
        timestamp: DateTime<Utc>,
    ) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: MetadataValue,
    ) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }

    /// The `category` metadata entry, when it is textual
    pub fn category(&self) -> Option<&str> {
        match self.metadata.get("category") {
            Some(MetadataValue::Text(c)) => Some(c.as_str()),
            _ => None,
        }
    }

    /// Decodes a wire payload as delivered by the push channel
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}
