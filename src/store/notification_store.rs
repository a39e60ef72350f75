use std::collections::HashSet;
use std::collections::VecDeque;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::Notification;
use crate::NotificationId;
use crate::ReadStateError;
use crate::Result;

/// How an entry reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Part of a snapshot page; already accounted for by the server stats
    Snapshot,
    /// Pushed over the live channel after activation
    Live,
}

/// State of a locally requested read mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMark {
    /// Applied optimistically, confirmation in flight
    Pending,
    /// Server acknowledged the mark
    Confirmed,
    /// Confirmation failed; the local mark is kept as the user's intent
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredNotification {
    pub notification: Notification,
    pub origin: Origin,
    /// `is_read` as carried by the snapshot (or the live event when the entry
    /// never appeared in one). Server stats are computed against this value.
    pub server_read: bool,
    pub read_mark: Option<ReadMark>,
}

impl StoredNotification {
    fn new(
        notification: Notification,
        origin: Origin,
    ) -> Self {
        let server_read = notification.is_read;
        Self {
            notification,
            origin,
            server_read,
            read_mark: None,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.notification.id
    }

    pub fn is_read(&self) -> bool {
        self.notification.is_read
    }

    /// Whether a local mark is waiting for (or failed) server confirmation
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self.read_mark, Some(ReadMark::Pending) | Some(ReadMark::Unconfirmed))
    }

    /// Read state as a surface sees it. Surfaces that hide unconfirmed marks
    /// see the server's last word instead.
    pub fn visible_read(
        &self,
        include_unconfirmed: bool,
    ) -> bool {
        if !include_unconfirmed && self.is_unconfirmed() {
            self.server_read
        } else {
            self.notification.is_read
        }
    }

    pub fn visible(
        &self,
        include_unconfirmed: bool,
    ) -> Notification {
        let mut n = self.notification.clone();
        n.is_read = self.visible_read(include_unconfirmed);
        n
    }
}

/// Result of a live ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveIngest {
    /// New entry at the front; `evicted` is set when a bounded store dropped its oldest
    Fresh { evicted: Option<NotificationId> },
    /// Id already known; nothing changed
    Duplicate,
}

impl LiveIngest {
    pub fn is_fresh(&self) -> bool {
        matches!(self, LiveIngest::Fresh { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Entries appended as older history
    pub inserted: usize,
    /// Entries already present (live or earlier snapshot)
    pub already_known: usize,
    /// Existing entries whose read state was taken from the snapshot
    pub read_state_adopted: usize,
    /// Entries dropped by the capacity bound
    pub evicted: usize,
}

#[derive(Debug, Default)]
pub struct NotificationStore {
    entries: VecDeque<StoredNotification>,
    ids: HashSet<NotificationId>,
    capacity: Option<usize>,
}

impl NotificationStore {
    /// Unbounded ledger backing snapshot-driven surfaces
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that retains only the `capacity` most recent entries
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(
        &self,
        id: &NotificationId,
    ) -> bool {
        self.ids.contains(id)
    }

    pub fn get(
        &self,
        id: &NotificationId,
    ) -> Option<&StoredNotification> {
        if !self.ids.contains(id) {
            return None;
        }
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Entries in display order (most recent arrival first)
    pub fn iter(&self) -> impl Iterator<Item = &StoredNotification> {
        self.entries.iter()
    }

    /// Inserts a live arrival at the front.
    ///
    /// Duplicate delivery of a known id is a no-op.
    pub fn ingest_live(
        &mut self,
        notification: Notification,
    ) -> LiveIngest {
        if self.ids.contains(&notification.id) {
            trace!(id = %notification.id, "duplicate live delivery ignored");
            return LiveIngest::Duplicate;
        }

        self.ids.insert(notification.id.clone());
        self.entries.push_front(StoredNotification::new(notification, Origin::Live));

        let evicted = match self.capacity {
            Some(cap) if self.entries.len() > cap => self.evict_oldest(),
            _ => None,
        };
        LiveIngest::Fresh { evicted }
    }

    /// Merges a snapshot page (most recent first) behind every entry already held.
    ///
    /// Unknown ids are appended in page order. Known ids keep their position
    /// and content; they adopt the snapshot's read state unless the user has
    /// already marked them locally, and become server-accounted.
    pub fn merge_snapshot(
        &mut self,
        page: Vec<Notification>,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for notification in page {
            if self.ids.contains(&notification.id) {
                outcome.already_known += 1;
                if let Some(entry) = self.entries.iter_mut().find(|e| e.id() == &notification.id) {
                    entry.origin = Origin::Snapshot;
                    entry.server_read = notification.is_read;
                    if entry.read_mark.is_none() && entry.notification.is_read != notification.is_read {
                        entry.notification.is_read = notification.is_read;
                        outcome.read_state_adopted += 1;
                    }
                }
                continue;
            }

            if matches!(self.capacity, Some(cap) if self.entries.len() >= cap) {
                // Snapshot entries are the oldest history; a full bounded store has no room.
                outcome.evicted += 1;
                continue;
            }

            self.ids.insert(notification.id.clone());
            self.entries.push_back(StoredNotification::new(notification, Origin::Snapshot));
            outcome.inserted += 1;
        }

        debug!(?outcome, len = self.entries.len(), "snapshot merged");
        outcome
    }

    /// Sets the local read state of `id` and records it as an unconfirmed mark.
    ///
    /// Returns whether the visible state changed.
    ///
    /// # Errors
    /// `ReadStateError::UnknownId` when the id is not held; nothing changes.
    pub fn set_read_state(
        &mut self,
        id: &NotificationId,
        is_read: bool,
    ) -> Result<bool> {
        let entry = self.entry_mut(id)?;
        let changed = entry.notification.is_read != is_read;
        entry.notification.is_read = is_read;
        entry.read_mark = Some(ReadMark::Pending);
        Ok(changed)
    }

    /// Records the server's answer to a read confirmation
    pub fn resolve_read_mark(
        &mut self,
        id: &NotificationId,
        confirmed: bool,
    ) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if confirmed {
            entry.read_mark = Some(ReadMark::Confirmed);
        } else {
            entry.read_mark = Some(ReadMark::Unconfirmed);
        }
        Ok(())
    }

    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.entries
            .iter()
            .filter(|e| !e.is_read())
            .map(|e| e.id().clone())
            .collect()
    }

    fn entry_mut(
        &mut self,
        id: &NotificationId,
    ) -> Result<&mut StoredNotification> {
        if self.ids.contains(id) {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id() == id) {
                return Ok(entry);
            }
        }
        warn!(id = %id, "read state change for unknown notification");
        Err(ReadStateError::UnknownId(id.clone()).into())
    }

    fn evict_oldest(&mut self) -> Option<NotificationId> {
        let evicted = self.entries.pop_back()?;
        self.ids.remove(evicted.id());
        trace!(id = %evicted.id(), "evicted oldest entry");
        Some(evicted.notification.id)
    }
}
