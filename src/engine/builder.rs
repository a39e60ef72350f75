//! Assembles a [`NotificationEngine`] and the handles its surfaces read from.
//!
//! ## Example
//! ```ignore
//! let EngineParts { engine, handle, mut alerts, .. } =
//!     EngineBuilder::new(config, service, channel).build()?;
//! tokio::spawn(engine.run());
//! let bell = handle.projection(BELL_DROPDOWN).unwrap();
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Advisory;
use super::EngineHandle;
use super::EngineMode;
use super::NotificationEngine;
use crate::Alert;
use crate::AlertPolicy;
use crate::ConnectionState;
use crate::EngineConfig;
use crate::EventChannel;
use crate::NotificationStore;
use crate::ProjectionConfig;
use crate::ProjectionRegistry;
use crate::ReadStateCoordinator;
use crate::Result;
use crate::SeverityAlertPolicy;
use crate::SnapshotService;
use crate::StatsTracker;

/// Everything produced by [`EngineBuilder::build`]
#[derive(Debug)]
pub struct EngineParts {
    pub engine: NotificationEngine,
    pub handle: EngineHandle,
    pub alerts: mpsc::UnboundedReceiver<Alert>,
    pub advisories: mpsc::UnboundedReceiver<Advisory>,
}

pub struct EngineBuilder {
    config: EngineConfig,
    service: Arc<dyn SnapshotService>,
    channel: Arc<dyn EventChannel>,
    mode: EngineMode,
    extra_projections: Vec<ProjectionConfig>,
    alert_policy: Option<Arc<dyn AlertPolicy>>,
}

impl EngineBuilder {
    pub fn new(
        config: EngineConfig,
        service: Arc<dyn SnapshotService>,
        channel: Arc<dyn EventChannel>,
    ) -> Self {
        Self {
            config,
            service,
            channel,
            mode: EngineMode::Full,
            extra_projections: Vec::new(),
            alert_policy: None,
        }
    }

    /// Live activity feed: no snapshot, no stats fetch, store bounded at
    /// `feed.capacity`, a single [`crate::LIVE_FEED`] projection.
    pub fn live_only(mut self) -> Self {
        self.mode = EngineMode::LiveOnly;
        self
    }

    /// Registers a surface in addition to the configured ones
    pub fn projection(
        mut self,
        config: ProjectionConfig,
    ) -> Self {
        self.extra_projections.push(config);
        self
    }

    /// Replaces the default [`SeverityAlertPolicy`]
    pub fn alert_policy(
        mut self,
        policy: Arc<dyn AlertPolicy>,
    ) -> Self {
        self.alert_policy = Some(policy);
        self
    }

    /// # Errors
    /// `Error::InvalidConfig` for an invalid configuration or duplicate
    /// projection names.
    pub fn build(self) -> Result<EngineParts> {
        let config = self.config.validate()?;

        let (store, base_projections) = match self.mode {
            EngineMode::Full => (NotificationStore::new(), config.projections.clone()),
            EngineMode::LiveOnly => (
                NotificationStore::bounded(config.feed.capacity),
                vec![config.feed.projection()],
            ),
        };

        let mut registry = ProjectionRegistry::new();
        let mut views = BTreeMap::new();
        for projection in base_projections.into_iter().chain(self.extra_projections) {
            let view = registry.register(projection)?;
            views.insert(view.name().to_string(), view);
        }

        let (event_tx, event_rx) = mpsc::channel(config.runtime.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel(config.runtime.command_buffer_size);
        let (alert_tx, alerts) = mpsc::unbounded_channel();
        let (advisory_tx, advisories) = mpsc::unbounded_channel();
        let (connection, connection_rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = CancellationToken::new();
        let stats = StatsTracker::new();

        let alert_policy: Arc<dyn AlertPolicy> = match self.alert_policy {
            Some(policy) => policy,
            None => Arc::new(SeverityAlertPolicy::new(&config.alerts)),
        };
        let coordinator = ReadStateCoordinator::new(
            self.service.clone(),
            event_tx.clone(),
            config.read_state.clone(),
            shutdown.clone(),
        );

        let handle = EngineHandle {
            command_tx,
            views: Arc::new(views),
            stats: stats.subscribe(),
            connection: connection_rx,
            shutdown: shutdown.clone(),
        };

        debug!(mode = ?self.mode, projections = registry.len(), "engine built");
        let engine = NotificationEngine {
            mode: self.mode,
            config,
            store,
            registry,
            stats,
            coordinator,
            alert_policy,
            service: self.service,
            channel: self.channel,
            subscription: None,
            activated: false,
            snapshot_settled: false,
            deferred_pages: Vec::new(),
            connection,
            alert_tx,
            advisory_tx,
            event_tx,
            event_rx,
            command_rx,
            shutdown,
        };

        Ok(EngineParts {
            engine,
            handle,
            alerts,
            advisories,
        })
    }
}
