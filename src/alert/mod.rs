//! Alert policy module.
//! Decides which live arrivals deserve an ephemeral, on-screen alert.

mod severity_policy;
pub use severity_policy::*;


use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::Notification;
use crate::NotificationId;
use crate::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertUrgency {
    /// Lower urgency, shorter dwell
    Warning,
    /// Demands attention, extended dwell
    Critical,
}

/// Ephemeral alert for a UI toast layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: NotificationId,
    pub severity: Severity,
    pub urgency: AlertUrgency,
    pub dwell: Duration,
    pub text: String,
}

/// Evaluated once per live arrival, never for snapshot entries.
/// Implementations are stateless.
#[cfg_attr(test, automock)]
pub trait AlertPolicy: Send + Sync + 'static {
    fn evaluate(
        &self,
        notification: &Notification,
    ) -> Option<Alert>;
}
