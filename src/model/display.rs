//! Human readable labels derived from notification fields.

use chrono::DateTime;
use chrono::Utc;

use crate::NotificationType;

/// Label for a notification type; `fallback` names the `Other` bucket, which
/// differs between surfaces ("Notification" in lists, "Activity" in the feed).
pub fn type_label(
    kind: NotificationType,
    fallback: &'static str,
) -> &'static str {
    match kind {
        NotificationType::ThreatAnalyzed => "Analysis",
        NotificationType::NewThreat => "New Threat",
        NotificationType::SystemAlert => "System Alert",
        NotificationType::Other => fallback,
    }
}

pub fn user_display_name(user_id: &str) -> &str {
    match user_id {
        "system" => "System",
        "analyst" => "Security Analyst",
        other => other,
    }
}

/// Coarse age of `timestamp` relative to `now`.
///
/// Timestamps in the future (client clock behind the server) read as "Just now".
pub fn relative_age(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let mins = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
