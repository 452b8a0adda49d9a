//! Reconciliation of the offline punch queue with the backend.

use log::{debug, info, warn};

use punchclock_core::{OfflineQueue, PendingEvent, QueuedEntry, StoredEntry};

use crate::client::ResilientClient;
use crate::error::{ConnectError, Result};
use crate::types::{ApiRequest, PunchRequest, SyncReport, PUNCH_PATH};

/// Outcome of replaying a single queued punch.
enum ReplayOutcome {
    Accepted,
    Retained(ConnectError),
}

async fn replay_event(
    client: &ResilientClient,
    token: &str,
    event: &PendingEvent,
) -> ReplayOutcome {
    let request = match build_punch_request(token, event) {
        Ok(request) => request,
        Err(err) => return ReplayOutcome::Retained(err),
    };
    match client.dispatch(&request).await {
        Ok(response) if response.status().is_success() => ReplayOutcome::Accepted,
        Ok(response) => {
            let status = response.status().as_u16();
            ReplayOutcome::Retained(ConnectError::api(status, "Punch rejected by backend"))
        }
        Err(err) => ReplayOutcome::Retained(err),
    }
}

fn build_punch_request(token: &str, event: &PendingEvent) -> Result<ApiRequest> {
    ApiRequest::post(PUNCH_PATH)
        .bearer(token)?
        .json(&PunchRequest::from(event))
}

/// Replay every queued punch once, in queue order, with `token` as bearer.
///
/// Accepted punches are dropped; everything else stays queued in its original
/// relative order, including stored elements that cannot be read as a punch.
/// The queue is rewritten once after all entries were tried.
/// Delivery is at-least-once: a punch accepted by the backend whose response
/// was lost will be sent again on the next pass.
pub async fn sync_offline_queue(
    client: &ResilientClient,
    queue: &OfflineQueue,
    token: &str,
) -> SyncReport {
    let entries = queue.entries();
    if entries.is_empty() {
        debug!("[OfflineSync] Queue empty, nothing to migrate");
        return SyncReport {
            migrated: 0,
            remaining: 0,
        };
    }

    let total = entries.len();
    let mut migrated = 0usize;
    let mut remaining: Vec<QueuedEntry> = Vec::new();

    for entry in entries {
        let event = match entry {
            StoredEntry::Decoded(event) => event,
            StoredEntry::Raw(_) => {
                warn!("[OfflineSync] Keeping unreadable queue entry");
                remaining.push(entry);
                continue;
            }
        };
        match replay_event(client, token, &event).await {
            ReplayOutcome::Accepted => migrated += 1,
            ReplayOutcome::Retained(err) => {
                debug!(
                    "[OfflineSync] Keeping '{}' punch from {} ({:?}): {}",
                    event.punch_type,
                    event.timestamp,
                    err.retry_class(),
                    err
                );
                remaining.push(StoredEntry::Decoded(event));
            }
        }
    }

    if let Err(err) = queue.retain_pending(&remaining) {
        warn!("[OfflineSync] Failed to persist remaining queue: {}", err);
    }

    info!(
        "[OfflineSync] Migrated {}/{} queued punches ({} remaining)",
        migrated,
        total,
        remaining.len()
    );
    SyncReport {
        migrated,
        remaining: remaining.len(),
    }
}
