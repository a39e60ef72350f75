use std::time::Duration;

use super::Alert;
use super::AlertPolicy;
use super::AlertUrgency;
use crate::AlertConfig;
use crate::Notification;
use crate::Severity;

/// High arrivals raise critical alerts, medium arrivals raise warnings,
/// everything else stays in the projections only.
#[derive(Debug, Clone)]
pub struct SeverityAlertPolicy {
    high_dwell: Duration,
    medium_dwell: Duration,
}

impl SeverityAlertPolicy {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            high_dwell: config.high_dwell(),
            medium_dwell: config.medium_dwell(),
        }
    }
}

impl Default for SeverityAlertPolicy {
    fn default() -> Self {
        Self::new(&AlertConfig::default())
    }
}

impl AlertPolicy for SeverityAlertPolicy {
    fn evaluate(
        &self,
        notification: &Notification,
    ) -> Option<Alert> {
        let (urgency, dwell, marker) = match notification.severity {
            Severity::High => (AlertUrgency::Critical, self.high_dwell, "🚨"),
            Severity::Medium => (AlertUrgency::Warning, self.medium_dwell, "⚠️"),
            Severity::Low | Severity::Info => return None,
        };

        Some(Alert {
            id: notification.id.clone(),
            severity: notification.severity,
            urgency,
            dwell,
            text: format!("{marker} {}", notification.title),
        })
    }
}
