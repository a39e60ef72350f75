use std::sync::Arc;

use futures::stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::BackoffPolicy;
use crate::EngineEvent;
use crate::NotificationId;
use crate::NotificationStore;
use crate::ReadStateConfig;
use crate::ReadStateError;
use crate::Result;
use crate::SnapshotService;
use crate::StatsTracker;

/// Outcome of a "mark all read" batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkAllReadReport {
    /// Confirmations issued
    pub attempted: usize,
    /// Confirmations the server acknowledged
    pub confirmed: usize,
    /// Ids whose confirmation failed; their local mark is kept
    pub failed: Vec<NotificationId>,
}

impl MarkAllReadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ReadStateCoordinator {
    service: Arc<dyn SnapshotService>,
    event_tx: mpsc::Sender<EngineEvent>,
    config: ReadStateConfig,
    /// Confirmations completing after deactivation are dropped
    shutdown: CancellationToken,
}

impl ReadStateCoordinator {
    pub(crate) fn new(
        service: Arc<dyn SnapshotService>,
        event_tx: mpsc::Sender<EngineEvent>,
        config: ReadStateConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            event_tx,
            config,
            shutdown,
        }
    }

    /// Marks `id` read locally and adjusts the published unread count.
    ///
    /// The count only moves when the entry actually transitioned, so repeated
    /// marks never double-decrement.
    pub fn apply_optimistic(
        &self,
        id: &NotificationId,
        store: &mut NotificationStore,
        stats: &StatsTracker,
    ) -> Result<bool> {
        let changed = store.set_read_state(id, true)?;
        if changed {
            stats.decrement_unread();
        }
        debug!(id = %id, changed, "optimistic read mark applied");
        Ok(changed)
    }

    /// Optimistic mark followed by a background confirmation. The outcome
    /// comes back to the engine as [`EngineEvent::ReadConfirmed`], which
    /// answers `reply`.
    ///
    /// An unknown id is answered right away with `ReadStateError::UnknownId`
    /// and no request is issued.
    pub(crate) fn mark_read(
        &self,
        id: NotificationId,
        store: &mut NotificationStore,
        stats: &StatsTracker,
        reply: oneshot::Sender<Result<()>>,
    ) {
        if let Err(e) = self.apply_optimistic(&id, store, stats) {
            if reply.send(Err(e)).is_err() {
                trace!(id = %id, "mark_read caller went away");
            }
            return;
        }

        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        let policy = self.config.confirm;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let result = confirm(service, id.clone(), policy).await;
            let event = EngineEvent::ReadConfirmed {
                id,
                result,
                reply: Some(reply),
            };
            if shutdown.is_cancelled() || event_tx.send(event).await.is_err() {
                debug!("engine stopped; read confirmation discarded");
            }
        });
    }

    /// Marks every id read locally, then confirms them as a bounded-concurrency
    /// batch. Each item is best effort: a failure never stops the others.
    pub(crate) fn mark_all_read(
        &self,
        ids: Vec<NotificationId>,
        store: &mut NotificationStore,
        stats: &StatsTracker,
        reply: oneshot::Sender<Result<MarkAllReadReport>>,
    ) {
        let mut known = Vec::with_capacity(ids.len());
        for id in ids {
            match self.apply_optimistic(&id, store, stats) {
                Ok(_) => known.push(id),
                Err(e) => warn!(id = %id, "skipping mark: {}", e),
            }
        }

        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        let policy = self.config.confirm;
        let concurrency = self.config.confirm_concurrency;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut report = MarkAllReadReport {
                attempted: known.len(),
                ..Default::default()
            };

            let mut confirmations = stream::iter(known)
                .map(|id| {
                    let service = service.clone();
                    async move {
                        let result = confirm(service, id.clone(), policy).await;
                        (id, result)
                    }
                })
                .buffer_unordered(concurrency);

            while let Some((id, result)) = confirmations.next().await {
                match &result {
                    Ok(()) => report.confirmed += 1,
                    Err(_) => report.failed.push(id.clone()),
                }
                let event = EngineEvent::ReadConfirmed {
                    id,
                    result,
                    reply: None,
                };
                if shutdown.is_cancelled() || event_tx.send(event).await.is_err() {
                    debug!("engine stopped; batch confirmation discarded");
                    return;
                }
            }

            let event = EngineEvent::BatchConfirmed { report, reply };
            if shutdown.is_cancelled() || event_tx.send(event).await.is_err() {
                debug!("engine stopped; batch report discarded");
            }
        });
    }

    /// Applies a confirmation outcome to the store and re-derives counters.
    ///
    /// # Errors
    /// `ReadStateError::Confirmation` when the server did not acknowledge the
    /// mark. The local mark stays in place.
    pub fn reconcile(
        &self,
        id: &NotificationId,
        result: Result<()>,
        store: &mut NotificationStore,
        stats: &StatsTracker,
    ) -> Result<()> {
        let confirmed = result.is_ok();
        if let Err(e) = store.resolve_read_mark(id, confirmed) {
            // Entry left a bounded store while the request was in flight.
            debug!(id = %id, "confirmation for evicted entry: {}", e);
        }
        stats.rederive(store);

        match result {
            Ok(()) => {
                debug!(id = %id, "read mark confirmed");
                Ok(())
            }
            Err(source) => {
                warn!(id = %id, "read confirmation failed, keeping local mark: {}", source);
                Err(ReadStateError::Confirmation {
                    id: id.clone(),
                    source: Box::new(source),
                }
                .into())
            }
        }
    }
}

async fn confirm(
    service: Arc<dyn SnapshotService>,
    id: NotificationId,
    policy: BackoffPolicy,
) -> Result<()> {
    task_with_timeout_and_exponential_backoff(
        || {
            let service = service.clone();
            let id = id.clone();
            async move { service.confirm_read(&id).await }
        },
        policy,
    )
    .await
}
