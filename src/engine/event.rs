use tokio::sync::oneshot;

use crate::MarkAllReadReport;
use crate::Notification;
use crate::NotificationId;
use crate::ProjectionFilter;
use crate::Result;
use crate::Stats;

/// Completions of work the engine spawned off its loop
#[derive(Debug)]
pub(crate) enum EngineEvent {
    SnapshotLoaded(Result<Vec<Notification>>),
    /// Unread-only page requested for a surface filtering `unread`
    UnreadPageLoaded {
        projection: String,
        result: Result<Vec<Notification>>,
    },
    StatsLoaded(Result<Stats>),
    ReadConfirmed {
        id: NotificationId,
        result: Result<()>,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    BatchConfirmed {
        report: MarkAllReadReport,
        reply: oneshot::Sender<Result<MarkAllReadReport>>,
    },
}

/// Requests issued by UI surfaces through an [`crate::EngineHandle`]
#[derive(Debug)]
pub(crate) enum EngineCommand {
    MarkRead {
        id: NotificationId,
        reply: oneshot::Sender<Result<()>>,
    },
    MarkAllRead {
        projection: String,
        reply: oneshot::Sender<Result<MarkAllReadReport>>,
    },
    SetFilter {
        projection: String,
        filter: ProjectionFilter,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Non-fatal failure reported to the UI layer.
///
/// The engine keeps running after every advisory; the worst case is stale or
/// zero stats while live events keep flowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Snapshot fetch failed; surfaces show live arrivals only
    SnapshotUnavailable { reason: String },
    /// Stats fetch failed; counters describe the store contents only
    StatsUnavailable { reason: String },
    /// A read mark could not be confirmed; it stays applied locally
    ConfirmationFailed { id: NotificationId, reason: String },
    /// Live channel subscription or join failed
    ChannelUnavailable { reason: String },
}

impl Advisory {
    pub fn reason(&self) -> &str {
        match self {
            Advisory::SnapshotUnavailable { reason }
            | Advisory::StatsUnavailable { reason }
            | Advisory::ConfirmationFailed { reason, .. }
            | Advisory::ChannelUnavailable { reason } => reason,
        }
    }
}
