//! Offline-capable core of the punch clock client.
//!
//! Holds the persistent key-value store abstraction, credential hashing, the
//! offline user registry and the pending attendance queue. Nothing here talks
//! to the network; reconciliation with the backend lives in
//! `punchclock-connect`.

pub mod crypto;
pub mod errors;
pub mod offline;
pub mod store;
pub mod utils;

pub use errors::{StoreError, StoreResult};
pub use offline::{
    EnqueueOutcome, HistoryEntry, OfflineAuthStore, OfflineQueue, OfflineUserRecord,
    PendingEvent, QueuedEntry, RegisterOutcome, Session,
};
pub use store::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, StoredEntry};
