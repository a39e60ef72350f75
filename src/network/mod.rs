//! Contracts of the external collaborators the engine consumes.
//!
//! Neither the snapshot service nor the push channel is implemented here;
//! production code plugs in its own transport, tests use mocks or
//! [`crate::adapters::memory`].

mod subscription;
pub use subscription::*;

#[cfg(test)]
mod subscription_test;

#[cfg(test)]
use mockall::automock;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Notification;
use crate::NotificationId;
use crate::Result;
use crate::Stats;

/// Messages delivered by the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Notification(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Request/response access to persisted notifications
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotService: Send + Sync + 'static {
    /// Returns at most `limit` notifications, most recent first.
    ///
    /// # Errors
    /// Any transport or server failure. The engine degrades to an empty
    /// snapshot and keeps serving live events.
    async fn fetch_notifications(
        &self,
        limit: usize,
        unread_only: bool,
    ) -> Result<Vec<Notification>>;

    /// Server-side aggregate counters at the time of the request
    async fn fetch_stats(&self) -> Result<Stats>;

    /// Persists a read mark. Idempotent: confirming an already read id succeeds.
    async fn confirm_read(
        &self,
        id: &NotificationId,
    ) -> Result<()>;
}

/// Long-lived, self-reconnecting push channel
#[cfg_attr(test, automock)]
pub trait EventChannel: Send + Sync + 'static {
    /// Opens the single subscription this surface may hold.
    ///
    /// # Errors
    /// `ChannelError::AlreadySubscribed` while another subscription is active.
    fn subscribe(&self) -> Result<mpsc::Receiver<ChannelEvent>>;

    /// Signals interest in notification events. Must be re-issued after every
    /// reconnect; the channel forgets it on disconnect.
    fn join(&self) -> Result<()>;

    /// Releases the subscription. Calling it without an active subscription
    /// is a no-op.
    fn unsubscribe(&self);
}
