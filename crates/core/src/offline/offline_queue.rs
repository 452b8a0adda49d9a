//! Durable queue of punches recorded while the backend was unreachable.

use chrono::{Local, NaiveDateTime};
use log::{debug, warn};
use std::sync::Arc;

use crate::errors::StoreResult;
use crate::store::{KeyValueStore, KeyValueStoreExt, StoredEntry, OFFLINE_QUEUE_KEY};
use crate::utils::local_timestamp::{format_local_timestamp, in_same_month};

use super::{EnqueueOutcome, HistoryEntry, PendingEvent};

/// Queue element as persisted; undecodable elements are carried unchanged.
pub type QueuedEntry = StoredEntry<PendingEvent>;

/// Append-only log of pending attendance events.
///
/// Insertion order is creation order; entries are only ever removed by
/// [`OfflineQueue::retain_pending`] after a reconciliation pass.
#[derive(Clone)]
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every stored element in insertion order, readable or not.
    pub fn entries(&self) -> Vec<QueuedEntry> {
        self.store.read_or(OFFLINE_QUEUE_KEY, Vec::new())
    }

    /// Queued events that decode, in insertion order.
    pub fn pending(&self) -> Vec<PendingEvent> {
        self.entries()
            .into_iter()
            .filter_map(StoredEntry::into_decoded)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.entries().len()
    }

    /// Queue a punch stamped with the current local time.
    pub fn enqueue(&self, punch_type: &str, neighborhood: &str, city: &str) -> EnqueueOutcome {
        self.enqueue_at(punch_type, neighborhood, city, Local::now().naive_local())
    }

    /// Queue a punch stamped with `at`.
    pub fn enqueue_at(
        &self,
        punch_type: &str,
        neighborhood: &str,
        city: &str,
        at: NaiveDateTime,
    ) -> EnqueueOutcome {
        let mut queue = self.entries();
        queue.push(StoredEntry::Decoded(PendingEvent {
            punch_type: punch_type.to_string(),
            timestamp: format_local_timestamp(&at),
            neighborhood: neighborhood.to_string(),
            city: city.to_string(),
        }));
        if let Err(err) = self.store.write(OFFLINE_QUEUE_KEY, &queue) {
            warn!("[OfflineQueue] Failed to persist queued punch: {}", err);
        }
        debug!(
            "[OfflineQueue] Queued '{}' punch ({} pending)",
            punch_type,
            queue.len()
        );
        EnqueueOutcome { ok: true }
    }

    /// Queued events from the current calendar month.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history_at(Local::now().naive_local())
    }

    /// Queued events from the calendar month of `now`.
    ///
    /// Entries with unreadable timestamps are kept.
    pub fn history_at(&self, now: NaiveDateTime) -> Vec<HistoryEntry> {
        self.pending()
            .into_iter()
            .filter(|event| in_same_month(&event.timestamp, &now))
            .map(HistoryEntry::from)
            .collect()
    }

    /// Rewrite the queue to exactly `remaining`.
    pub fn retain_pending(&self, remaining: &[QueuedEntry]) -> StoreResult<()> {
        self.store.write(OFFLINE_QUEUE_KEY, remaining)
    }
}
