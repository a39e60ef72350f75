use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tracing::debug;
use tracing::trace;

use crate::ChannelError;
use crate::ChannelEvent;
use crate::Error;
use crate::EventChannel;
use crate::Notification;
use crate::NotificationId;
use crate::Result;
use crate::SnapshotService;
use crate::Stats;

const CHANNEL_BUFFER: usize = 128;

#[derive(Debug, Default)]
struct ServiceState {
    notifications: Vec<Notification>,
    stats: Option<Stats>,
    fail_snapshot: bool,
    fail_stats: bool,
    fail_confirm: HashSet<NotificationId>,
    confirmed: Vec<NotificationId>,
    held: HashSet<Gate>,
}

/// Service calls that can be held back to simulate a slow server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Snapshot,
    Stats,
    Confirm,
}

/// Snapshot service backed by a vector held most recent first.
///
/// Stats are derived from the held notifications unless overridden. Failures
/// and per-call gates can be injected to reproduce slow or broken servers.
#[derive(Debug, Default, Clone)]
pub struct InMemorySnapshotService {
    state: Arc<Mutex<ServiceState>>,
    gate: Arc<Notify>,
}

impl InMemorySnapshotService {
    pub fn new(notifications: Vec<Notification>) -> Self {
        let service = Self::default();
        service.state.lock().notifications = notifications;
        service
    }

    /// Adds a notification as the most recent one
    pub fn push(
        &self,
        notification: Notification,
    ) {
        self.state.lock().notifications.insert(0, notification);
    }

    pub fn set_stats(
        &self,
        stats: Stats,
    ) {
        self.state.lock().stats = Some(stats);
    }

    pub fn fail_snapshot(
        &self,
        fail: bool,
    ) {
        self.state.lock().fail_snapshot = fail;
    }

    pub fn fail_stats(
        &self,
        fail: bool,
    ) {
        self.state.lock().fail_stats = fail;
    }

    /// Makes every confirmation of `id` fail
    pub fn fail_confirm(
        &self,
        id: impl Into<NotificationId>,
    ) {
        self.state.lock().fail_confirm.insert(id.into());
    }

    /// Holds responses of the gated call until [`Self::release`]
    pub fn hold(
        &self,
        gate: Gate,
    ) {
        self.state.lock().held.insert(gate);
    }

    pub fn release(
        &self,
        gate: Gate,
    ) {
        self.state.lock().held.remove(&gate);
        self.gate.notify_waiters();
    }

    /// Ids confirmed so far, in confirmation order
    pub fn confirmed(&self) -> Vec<NotificationId> {
        self.state.lock().confirmed.clone()
    }

    pub fn is_read(
        &self,
        id: &NotificationId,
    ) -> Option<bool> {
        self.state
            .lock()
            .notifications
            .iter()
            .find(|n| &n.id == id)
            .map(|n| n.is_read)
    }

    async fn wait_for_gate(
        &self,
        gate: Gate,
    ) {
        loop {
            let released = self.gate.notified();
            let gated = self.state.lock().held.contains(&gate);
            if !gated {
                return;
            }
            released.await;
        }
    }
}

#[async_trait]
impl SnapshotService for InMemorySnapshotService {
    async fn fetch_notifications(
        &self,
        limit: usize,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        self.wait_for_gate(Gate::Snapshot).await;

        let state = self.state.lock();
        if state.fail_snapshot {
            return Err(Error::Service("snapshot unavailable".to_string()));
        }
        let page: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| !unread_only || !n.is_read)
            .take(limit)
            .cloned()
            .collect();
        debug!(limit, unread_only, returned = page.len(), "serving snapshot");
        Ok(page)
    }

    async fn fetch_stats(&self) -> Result<Stats> {
        self.wait_for_gate(Gate::Stats).await;

        let state = self.state.lock();
        if state.fail_stats {
            return Err(Error::Service("stats unavailable".to_string()));
        }
        if let Some(stats) = &state.stats {
            return Ok(stats.clone());
        }

        let mut stats = Stats::default();
        for n in &state.notifications {
            stats.total_count += 1;
            if !n.is_read {
                stats.unread_count += 1;
            }
            *stats.severity_counts.entry(n.severity).or_insert(0) += 1;
        }
        Ok(stats)
    }

    async fn confirm_read(
        &self,
        id: &NotificationId,
    ) -> Result<()> {
        self.wait_for_gate(Gate::Confirm).await;

        let mut state = self.state.lock();
        if state.fail_confirm.contains(id) {
            return Err(Error::Service(format!("cannot persist read mark for {id}")));
        }
        if let Some(n) = state.notifications.iter_mut().find(|n| &n.id == id) {
            n.is_read = true;
        }
        state.confirmed.push(id.clone());
        trace!(id = %id, "read mark persisted");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    sender: Option<mpsc::Sender<ChannelEvent>>,
    joined: bool,
    refuse: bool,
    joins: usize,
    unsubscribes: usize,
}

/// Push channel driven by the caller.
///
/// Notifications are only delivered after `join`. A disconnect forgets the
/// join, so subscribers must join again once reconnected.
#[derive(Debug, Default, Clone)]
pub struct LocalEventChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl LocalEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self) -> bool {
        self.emit(ChannelEvent::Connected)
    }

    pub fn disconnect(&self) -> bool {
        self.state.lock().joined = false;
        self.emit(ChannelEvent::Disconnected)
    }

    /// Delivers a notification; returns whether a joined subscriber received it
    pub fn publish(
        &self,
        notification: Notification,
    ) -> bool {
        let joined = self.state.lock().joined;
        if !joined {
            trace!(id = %notification.id, "nobody joined; notification dropped");
            return false;
        }
        self.emit(ChannelEvent::Notification(notification))
    }

    /// Makes subscription attempts fail, as when the channel is unreachable
    pub fn refuse_subscriptions(
        &self,
        refuse: bool,
    ) {
        self.state.lock().refuse = refuse;
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().sender.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn join_count(&self) -> usize {
        self.state.lock().joins
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.state.lock().unsubscribes
    }

    fn emit(
        &self,
        event: ChannelEvent,
    ) -> bool {
        let state = self.state.lock();
        match &state.sender {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }
}

impl EventChannel for LocalEventChannel {
    fn subscribe(&self) -> Result<mpsc::Receiver<ChannelEvent>> {
        let mut state = self.state.lock();
        if state.refuse {
            return Err(ChannelError::SubscribeFailed("channel unreachable".to_string()).into());
        }
        if state.sender.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(ChannelError::AlreadySubscribed.into());
        }
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        state.sender = Some(tx);
        Ok(rx)
    }

    fn join(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.sender.is_none() {
            return Err(ChannelError::JoinFailed("not subscribed".to_string()).into());
        }
        state.joined = true;
        state.joins += 1;
        Ok(())
    }

    fn unsubscribe(&self) {
        let mut state = self.state.lock();
        if state.sender.take().is_some() {
            state.joined = false;
            state.unsubscribes += 1;
            debug!("local channel unsubscribed");
        }
    }
}
