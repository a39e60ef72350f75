use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::Advisory;
use super::EngineCommand;
use super::EngineEvent;
use crate::utils::async_task::task_with_timeout;
use crate::Alert;
use crate::AlertPolicy;
use crate::ChannelEvent;
use crate::ConnectionState;
use crate::EngineConfig;
use crate::EventChannel;
use crate::FetchError;
use crate::LiveIngest;
use crate::Notification;
use crate::NotificationStore;
use crate::ProjectionFilter;
use crate::ProjectionRegistry;
use crate::ReadStateCoordinator;
use crate::Result;
use crate::SnapshotService;
use crate::StatsTracker;
use crate::Subscription;

/// What an engine fetches on activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Snapshot and stats on activation, live events merged on top
    Full,
    /// Live events only, bounded at ingestion; no fetches
    LiveOnly,
}

/// Owns the store and every piece of state derived from it.
///
/// All mutations happen inside [`NotificationEngine::run`]; surfaces only see
/// what the engine publishes through the [`crate::EngineHandle`].
pub struct NotificationEngine {
    pub(super) mode: EngineMode,
    pub(super) config: EngineConfig,

    pub(super) store: NotificationStore,
    pub(super) registry: ProjectionRegistry,
    pub(super) stats: StatsTracker,
    pub(super) coordinator: ReadStateCoordinator,
    pub(super) alert_policy: Arc<dyn AlertPolicy>,

    pub(super) service: Arc<dyn SnapshotService>,
    pub(super) channel: Arc<dyn EventChannel>,
    pub(super) subscription: Option<Subscription>,
    pub(super) activated: bool,
    /// Set once the activation snapshot has been applied or has failed.
    /// Unread pages landing earlier wait in `deferred_pages` so they end up
    /// behind the newer snapshot entries.
    pub(super) snapshot_settled: bool,
    pub(super) deferred_pages: Vec<Vec<Notification>>,

    pub(super) connection: watch::Sender<ConnectionState>,
    pub(super) alert_tx: mpsc::UnboundedSender<Alert>,
    pub(super) advisory_tx: mpsc::UnboundedSender<Advisory>,

    pub(super) event_tx: mpsc::Sender<EngineEvent>,
    pub(super) event_rx: mpsc::Receiver<EngineEvent>,
    pub(super) command_rx: mpsc::Receiver<EngineCommand>,
    pub(super) shutdown: CancellationToken,
}

impl NotificationEngine {
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Activates the surface and processes events until deactivated.
    pub async fn run(mut self) -> Result<()> {
        if let Err(e) = self.activate() {
            // Snapshot-backed surfaces stay useful without the live channel.
            error!("activation incomplete: {}", e);
        }

        while self.step().await {}

        self.deactivate();
        Ok(())
    }

    /// Issues the activation fetches and subscribes to the live channel.
    /// Calling it again on an active engine does nothing.
    ///
    /// # Errors
    /// `ChannelError` when the subscription cannot be opened. Fetches already
    /// issued keep running.
    #[instrument(skip(self), fields(mode = ?self.mode))]
    pub fn activate(&mut self) -> Result<()> {
        if self.activated {
            debug!("engine already active");
            return Ok(());
        }
        self.activated = true;

        if self.mode == EngineMode::Full {
            let max_page_size = self.config.snapshot.max_page_size;
            let (limit, unread_only) = self.registry.snapshot_request(max_page_size);
            self.spawn_snapshot_fetch(limit, unread_only);
            if !unread_only {
                for (projection, limit) in self.registry.unread_requests(max_page_size) {
                    self.spawn_unread_fetch(projection, limit);
                }
            }
            self.spawn_stats_fetch();
        }

        let subscription = match Subscription::open(self.channel.clone()) {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!("live channel subscription failed: {}", e);
                self.advise(Advisory::ChannelUnavailable { reason: e.to_string() });
                return Err(e);
            }
        };
        self.subscription = Some(subscription);
        self.join();

        self.registry.refresh(&self.store);
        info!(projections = self.registry.len(), "engine activated");
        Ok(())
    }

    /// Releases the live subscription. Results of requests still in flight
    /// are discarded once the loop has stopped.
    pub fn deactivate(&mut self) {
        self.shutdown.cancel();
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
            info!("engine deactivated");
        }
    }

    /// Waits for and handles one input. Returns `false` once the engine
    /// should stop.
    pub(crate) async fn step(&mut self) -> bool {
        tokio::select! {
            // Use biased to ensure branch order
            biased;
            // P0: deactivation
            _ = self.shutdown.cancelled() => {
                debug!("deactivation requested");
                false
            }
            // P1: fetch and confirmation completions
            Some(event) = self.event_rx.recv() => {
                trace!(?event, "receive engine event");
                self.handle_event(event);
                true
            }
            // P2: surface commands
            command = self.command_rx.recv() => {
                match command {
                    Some(command) => {
                        debug!(?command, "receive engine command");
                        self.handle_command(command);
                        true
                    }
                    None => {
                        info!("all engine handles dropped");
                        false
                    }
                }
            }
            // P3: live channel
            event = next_channel_event(&mut self.subscription) => {
                match event {
                    Some(event) => self.handle_channel_event(event),
                    None => {
                        warn!("live channel closed");
                        self.subscription = None;
                        self.connection.send_replace(ConnectionState::Disconnected);
                    }
                }
                true
            }
        }
    }

    pub(crate) fn handle_channel_event(
        &mut self,
        event: ChannelEvent,
    ) {
        match event {
            ChannelEvent::Connected => {
                debug!("live channel connected");
                self.connection.send_replace(ConnectionState::Connected);
                // The channel forgets interest on every reconnect.
                self.join();
            }
            ChannelEvent::Disconnected => {
                debug!("live channel disconnected");
                self.connection.send_replace(ConnectionState::Disconnected);
            }
            ChannelEvent::Notification(notification) => self.ingest_live(notification),
        }
    }

    pub(crate) fn handle_event(
        &mut self,
        event: EngineEvent,
    ) {
        match event {
            EngineEvent::SnapshotLoaded(Ok(page)) => {
                self.merge_page(page);
                self.settle_snapshot();
            }
            EngineEvent::SnapshotLoaded(Err(e)) => {
                let e = FetchError::Snapshot { source: Box::new(e) };
                warn!("{}; continuing with live events only", e);
                self.advise(Advisory::SnapshotUnavailable { reason: e.to_string() });
                self.settle_snapshot();
            }
            EngineEvent::UnreadPageLoaded {
                projection,
                result: Ok(page),
            } => {
                debug!(projection = %projection, len = page.len(), "unread page loaded");
                if self.snapshot_settled {
                    self.merge_page(page);
                } else {
                    self.deferred_pages.push(page);
                }
            }
            EngineEvent::UnreadPageLoaded {
                projection,
                result: Err(e),
            } => {
                let e = FetchError::Snapshot { source: Box::new(e) };
                warn!(projection = %projection, "{}; showing unread entries already held", e);
                self.advise(Advisory::SnapshotUnavailable { reason: e.to_string() });
            }
            EngineEvent::StatsLoaded(Ok(baseline)) => {
                self.stats.adopt_baseline(baseline, &self.store);
            }
            EngineEvent::StatsLoaded(Err(e)) => {
                let e = FetchError::Stats { source: Box::new(e) };
                warn!("{}; counting store contents only", e);
                self.advise(Advisory::StatsUnavailable { reason: e.to_string() });
                self.stats.rederive(&self.store);
            }
            EngineEvent::ReadConfirmed { id, result, reply } => {
                let outcome = self.coordinator.reconcile(&id, result, &mut self.store, &self.stats);
                if let Err(e) = &outcome {
                    self.advise(Advisory::ConfirmationFailed {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
                self.registry.refresh(&self.store);
                if let Some(reply) = reply {
                    if reply.send(outcome).is_err() {
                        trace!(id = %id, "mark_read caller went away");
                    }
                }
            }
            EngineEvent::BatchConfirmed { report, reply } => {
                info!(
                    attempted = report.attempted,
                    confirmed = report.confirmed,
                    failed = report.failed.len(),
                    "mark all read finished"
                );
                if reply.send(Ok(report)).is_err() {
                    trace!("mark_all_read caller went away");
                }
            }
        }
    }

    pub(crate) fn handle_command(
        &mut self,
        command: EngineCommand,
    ) {
        match command {
            EngineCommand::MarkRead { id, reply } => {
                self.coordinator.mark_read(id, &mut self.store, &self.stats, reply);
                self.registry.refresh(&self.store);
            }
            EngineCommand::MarkAllRead { projection, reply } => {
                match self.registry.unread_ids(&projection, &self.store) {
                    Ok(ids) => {
                        debug!(projection = %projection, count = ids.len(), "mark all read");
                        self.coordinator.mark_all_read(ids, &mut self.store, &self.stats, reply);
                        self.registry.refresh(&self.store);
                    }
                    Err(e) => {
                        warn!("mark all read rejected: {}", e);
                        if reply.send(Err(e)).is_err() {
                            trace!(projection = %projection, "mark_all_read caller went away");
                        }
                    }
                }
            }
            EngineCommand::SetFilter {
                projection,
                filter,
                reply,
            } => {
                let outcome = self.set_filter(&projection, filter);
                if let Err(e) = &outcome {
                    warn!("filter change rejected: {}", e);
                }
                if reply.send(outcome).is_err() {
                    trace!(projection = %projection, "set_filter caller went away");
                }
            }
        }
    }

    fn set_filter(
        &mut self,
        projection: &str,
        filter: ProjectionFilter,
    ) -> Result<()> {
        let changed = self.registry.set_filter(projection, filter, &self.store)?;
        if !changed || filter != ProjectionFilter::Unread {
            return Ok(());
        }
        // Before activation the activation fetches cover it.
        if self.mode == EngineMode::Full && self.activated {
            let max_page_size = self.config.snapshot.max_page_size;
            let limit = self
                .registry
                .get(projection)
                .map(|p| p.config().capacity.min(max_page_size))
                .unwrap_or(max_page_size);
            self.spawn_unread_fetch(projection.to_string(), limit);
        }
        Ok(())
    }

    fn merge_page(
        &mut self,
        page: Vec<Notification>,
    ) {
        let outcome = self.store.merge_snapshot(page);
        debug!(
            inserted = outcome.inserted,
            known = outcome.already_known,
            adopted = outcome.read_state_adopted,
            "snapshot page applied"
        );
        self.publish();
    }

    fn settle_snapshot(&mut self) {
        self.snapshot_settled = true;
        for page in std::mem::take(&mut self.deferred_pages) {
            self.merge_page(page);
        }
    }

    fn ingest_live(
        &mut self,
        notification: Notification,
    ) {
        let alert = if self.config.alerts.enabled {
            self.alert_policy.evaluate(&notification)
        } else {
            None
        };

        match self.store.ingest_live(notification) {
            LiveIngest::Fresh { evicted } => {
                if let Some(evicted) = evicted {
                    trace!(id = %evicted, "evicted from live feed");
                }
                if let Some(alert) = alert {
                    debug!(id = %alert.id, urgency = ?alert.urgency, "raising alert");
                    if self.alert_tx.send(alert).is_err() {
                        trace!("no alert listener");
                    }
                }
                self.publish();
            }
            LiveIngest::Duplicate => {}
        }
    }

    fn join(&self) {
        let Some(subscription) = &self.subscription else {
            return;
        };
        if let Err(e) = subscription.join() {
            warn!("join failed: {}", e);
            self.advise(Advisory::ChannelUnavailable { reason: e.to_string() });
        }
    }

    fn spawn_snapshot_fetch(
        &self,
        limit: usize,
        unread_only: bool,
    ) {
        let timeout = Duration::from_millis(self.config.snapshot.request_timeout_ms);
        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();

        debug!(limit, unread_only, "fetching snapshot");
        tokio::spawn(async move {
            let result = task_with_timeout(service.fetch_notifications(limit, unread_only), timeout).await;
            if shutdown.is_cancelled() || event_tx.send(EngineEvent::SnapshotLoaded(result)).await.is_err() {
                debug!("engine deactivated; snapshot discarded");
            }
        });
    }

    fn spawn_unread_fetch(
        &self,
        projection: String,
        limit: usize,
    ) {
        let timeout = Duration::from_millis(self.config.snapshot.request_timeout_ms);
        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();

        debug!(projection = %projection, limit, "fetching unread page");
        tokio::spawn(async move {
            let result = task_with_timeout(service.fetch_notifications(limit, true), timeout).await;
            let event = EngineEvent::UnreadPageLoaded { projection, result };
            if shutdown.is_cancelled() || event_tx.send(event).await.is_err() {
                debug!("engine deactivated; unread page discarded");
            }
        });
    }

    fn spawn_stats_fetch(&self) {
        let timeout = Duration::from_millis(self.config.snapshot.request_timeout_ms);
        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = task_with_timeout(service.fetch_stats(), timeout).await;
            if shutdown.is_cancelled() || event_tx.send(EngineEvent::StatsLoaded(result)).await.is_err() {
                debug!("engine deactivated; stats discarded");
            }
        });
    }

    /// Re-derives counters and republishes every projection
    fn publish(&self) {
        self.stats.rederive(&self.store);
        self.registry.refresh(&self.store);
    }

    fn advise(
        &self,
        advisory: Advisory,
    ) {
        if self.advisory_tx.send(advisory).is_err() {
            trace!("no advisory listener");
        }
    }
}

impl Drop for NotificationEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for NotificationEngine {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("NotificationEngine")
            .field("mode", &self.mode)
            .field("entries", &self.store.len())
            .field("projections", &self.registry.len())
            .field("activated", &self.activated)
            .field("subscription", &self.subscription)
            .finish()
    }
}

async fn next_channel_event(subscription: &mut Option<Subscription>) -> Option<ChannelEvent> {
    match subscription.as_mut() {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
