use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;

use crate::Notification;
use crate::NotificationId;
use crate::NotificationType;
use crate::Severity;
use crate::Stats;

pub(crate) fn id(n: impl ToString) -> NotificationId {
    NotificationId::from(n.to_string())
}

/// Notification whose timestamp grows with numeric ids, so fixtures built
/// from increasing ids are also chronologically ordered.
pub(crate) fn notification(
    n: impl ToString,
    severity: Severity,
    is_read: bool,
) -> Notification {
    let key = n.to_string();
    let offset = key.parse::<i64>().unwrap_or(0);
    let base = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    let mut notification = Notification::new(
        key.as_str(),
        NotificationType::NewThreat,
        severity,
        format!("Threat {key}"),
    )
    .with_message(format!("details for {key}"))
    .with_timestamp(base + Duration::seconds(offset));
    notification.is_read = is_read;
    notification
}

/// Unread notification as delivered by the push channel
pub(crate) fn live(
    n: impl ToString,
    severity: Severity,
) -> Notification {
    notification(n, severity, false)
}

pub(crate) fn view_ids<'a>(notifications: impl IntoIterator<Item = &'a Notification>) -> Vec<String> {
    notifications.into_iter().map(|n| n.id.to_string()).collect()
}

pub(crate) fn stats(
    unread_count: u64,
    total_count: u64,
    severities: &[(Severity, u64)],
) -> Stats {
    Stats {
        unread_count,
        total_count,
        severity_counts: severities.iter().copied().collect(),
    }
}
