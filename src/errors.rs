//! Notification Engine Error Hierarchy
//!
//! Every failure in the engine is recoverable. The variants are grouped by the
//! concern that produced them so callers can decide between retrying, surfacing
//! an advisory to the user, or ignoring the failure entirely.

use std::time::Duration;

use config::ConfigError;

use crate::NotificationId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Snapshot or stats retrieval failures (TransientFetchError)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Read-state mutation and confirmation failures
    #[error(transparent)]
    ReadState(#[from] ReadStateError),

    /// Live channel and engine plumbing failures
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration that parsed but does not make sense
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A service request exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The remote service rejected or failed the request
    #[error("Service request failed: {0}")]
    Service(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Initial page of notifications could not be retrieved
    #[error("Snapshot fetch failed: {source}")]
    Snapshot {
        #[source]
        source: Box<Error>,
    },

    /// Aggregate stats could not be retrieved
    #[error("Stats fetch failed: {source}")]
    Stats {
        #[source]
        source: Box<Error>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReadStateError {
    /// Mutation requested for an id the store has never seen (UnknownIdError)
    #[error("Notification {0} is not known to the store")]
    UnknownId(NotificationId),

    /// Server did not acknowledge a read mark (ConfirmationError).
    /// The local mark is kept.
    #[error("Read confirmation for {id} failed: {source}")]
    Confirmation {
        id: NotificationId,
        #[source]
        source: Box<Error>,
    },

    /// `mark_all_read` targeted a projection that was never registered
    #[error("Projection '{0}' is not registered")]
    UnknownProjection(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The event channel already serves another subscription
    #[error("Event channel already has an active subscription")]
    AlreadySubscribed,

    /// Subscription could not be established
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// `join` could not be delivered
    #[error("Join failed: {0}")]
    JoinFailed(String),

    /// The engine loop is gone; the surface was deactivated
    #[error("Notification engine stopped")]
    EngineStopped,
}

impl Error {
    /// Whether re-issuing the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_)
                | Error::Timeout(_)
                | Error::Service(_)
                | Error::ReadState(ReadStateError::Confirmation { .. })
        )
    }
}
