use std::collections::BTreeMap;
use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;

use crate::NotificationId;
use crate::NotificationStore;
use crate::Origin;
use crate::ReadMark;
use crate::Stats;

/// Derives [`Stats`] from the store and the server baseline, and publishes it.
///
/// With a baseline, totals are `baseline + live arrivals`, and snapshot
/// entries the user has read locally are subtracted from the unread count
/// unless the baseline already counts them as read.
/// Without one (not fetched yet, or the fetch failed) the counters describe
/// the store contents alone.
///
/// The published value may run ahead of the derivation while a read
/// confirmation is in flight.
#[derive(Debug)]
pub struct StatsTracker {
    baseline: Option<Stats>,
    /// Read state the baseline assumed for each snapshot entry held when it
    /// was adopted. A mark already confirmed by then is assumed counted.
    counted_read: HashMap<NotificationId, bool>,
    publisher: watch::Sender<Stats>,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTracker {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(Stats::default());
        Self {
            baseline: None,
            counted_read: HashMap::new(),
            publisher,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Stats> {
        self.publisher.subscribe()
    }

    pub fn current(&self) -> Stats {
        self.publisher.borrow().clone()
    }

    pub fn baseline(&self) -> Option<&Stats> {
        self.baseline.as_ref()
    }

    /// Pure derivation from the store and the adopted baseline
    pub fn derive(
        &self,
        store: &NotificationStore,
    ) -> Stats {
        match &self.baseline {
            Some(baseline) => derive_with_baseline(baseline, &self.counted_read, store),
            None => derive_from_store(store),
        }
    }

    /// Adopts the server counters and folds in everything that arrived live
    pub fn adopt_baseline(
        &mut self,
        baseline: Stats,
        store: &NotificationStore,
    ) {
        self.counted_read = store
            .iter()
            .filter(|entry| entry.origin == Origin::Snapshot)
            .map(|entry| {
                let counted = entry.server_read || entry.read_mark == Some(ReadMark::Confirmed);
                (entry.id().clone(), counted)
            })
            .collect();
        debug!(?baseline, covered = self.counted_read.len(), "stats baseline adopted");
        self.baseline = Some(baseline);
        self.rederive(store);
    }

    /// Replaces the published value with the derivation
    pub fn rederive(
        &self,
        store: &NotificationStore,
    ) {
        let derived = self.derive(store);
        self.publisher.send_if_modified(|current| {
            if *current == derived {
                false
            } else {
                *current = derived;
                true
            }
        });
    }

    /// Optimistic decrement applied while a read confirmation is in flight.
    /// Never goes below zero.
    pub fn decrement_unread(&self) {
        self.publisher.send_if_modified(|current| {
            if current.unread_count == 0 {
                false
            } else {
                current.unread_count -= 1;
                true
            }
        });
    }
}

fn derive_from_store(store: &NotificationStore) -> Stats {
    let mut stats = Stats::default();
    for entry in store.iter() {
        stats.total_count += 1;
        if !entry.is_read() {
            stats.unread_count += 1;
        }
        *stats.severity_counts.entry(entry.notification.severity).or_insert(0) += 1;
    }
    stats
}

fn derive_with_baseline(
    baseline: &Stats,
    counted_read: &HashMap<NotificationId, bool>,
    store: &NotificationStore,
) -> Stats {
    let mut live_total = 0u64;
    let mut live_unread = 0u64;
    let mut locally_read = 0u64;
    let mut severity_counts: BTreeMap<_, u64> = baseline.severity_counts.clone();

    for entry in store.iter() {
        match entry.origin {
            Origin::Live => {
                live_total += 1;
                if !entry.is_read() {
                    live_unread += 1;
                }
                *severity_counts.entry(entry.notification.severity).or_insert(0) += 1;
            }
            Origin::Snapshot => {
                // Entries merged after adoption are counted as the snapshot carried them.
                let counted = counted_read.get(entry.id()).copied().unwrap_or(entry.server_read);
                if !counted && entry.is_read() {
                    locally_read += 1;
                }
            }
        }
    }

    Stats {
        unread_count: (baseline.unread_count + live_unread).saturating_sub(locally_read),
        total_count: baseline.total_count + live_total,
        severity_counts,
    }
}
