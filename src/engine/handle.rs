use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::EngineCommand;
use crate::ChannelError;
use crate::ConnectionState;
use crate::MarkAllReadReport;
use crate::NotificationId;
use crate::ProjectionFilter;
use crate::ProjectionView;
use crate::Result;
use crate::Stats;

/// Cloneable entry point for UI surfaces.
///
/// Reads go straight to the published `watch` values; mutations are queued to
/// the engine loop. Every clone shares the same engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    pub(super) command_tx: mpsc::Sender<EngineCommand>,
    pub(super) views: Arc<BTreeMap<String, ProjectionView>>,
    pub(super) stats: watch::Receiver<Stats>,
    pub(super) connection: watch::Receiver<ConnectionState>,
    pub(super) shutdown: CancellationToken,
}

impl EngineHandle {
    /// Marks one notification read.
    ///
    /// The local mark is visible as soon as the engine picks the command up;
    /// this call resolves once the server has answered.
    ///
    /// # Errors
    /// - `ReadStateError::UnknownId` when the store does not hold `id`
    /// - `ReadStateError::Confirmation` when the server did not acknowledge the
    ///   mark; the local mark is kept
    /// - `ChannelError::EngineStopped` after deactivation
    pub async fn mark_read(
        &self,
        id: impl Into<NotificationId>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::MarkRead { id: id.into(), reply })
            .await
            .map_err(|_| ChannelError::EngineStopped)?;
        rx.await.map_err(|_| ChannelError::EngineStopped)?
    }

    /// Marks every entry the named projection currently shows as unread.
    /// Individual failures are listed in the report, not returned as errors.
    ///
    /// # Errors
    /// `ReadStateError::UnknownProjection` or `ChannelError::EngineStopped`.
    pub async fn mark_all_read(
        &self,
        projection: &str,
    ) -> Result<MarkAllReadReport> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::MarkAllRead {
                projection: projection.to_string(),
                reply,
            })
            .await
            .map_err(|_| ChannelError::EngineStopped)?;
        rx.await.map_err(|_| ChannelError::EngineStopped)?
    }

    /// Changes what a surface shows. The view is republished before this
    /// resolves. Switching to `unread` also fetches an unread-only page so
    /// older unread entries can fill the surface.
    ///
    /// # Errors
    /// `ReadStateError::UnknownProjection` or `ChannelError::EngineStopped`.
    pub async fn set_filter(
        &self,
        projection: &str,
        filter: ProjectionFilter,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(EngineCommand::SetFilter {
                projection: projection.to_string(),
                filter,
                reply,
            })
            .await
            .map_err(|_| ChannelError::EngineStopped)?;
        rx.await.map_err(|_| ChannelError::EngineStopped)?
    }

    pub fn projection(
        &self,
        name: &str,
    ) -> Option<ProjectionView> {
        self.views.get(name).cloned()
    }

    pub fn projection_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn stats(&self) -> Stats {
        self.stats.borrow().clone()
    }

    pub fn stats_receiver(&self) -> watch::Receiver<Stats> {
        self.stats.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn connection_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    /// Stops the engine and releases its live subscription
    pub fn deactivate(&self) {
        self.shutdown.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.shutdown.is_cancelled()
    }
}
