//! Persistent key-value store.
//!
//! Values are JSON documents addressed by a string key. The typed helpers in
//! [`KeyValueStoreExt`] never fail on read: a missing key, unparsable content or
//! a backend error all yield the caller's default.

mod file_store;
mod memory_store;

pub use file_store::*;
pub use memory_store::*;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;

/// Endpoint override chosen explicitly by the user or launch parameters.
pub const API_OVERRIDE_KEY: &str = "api_override";

/// Last base URL known to answer requests.
pub const API_BASE_KEY: &str = "api_base";

/// Offline user registry keyed by enrollment id.
pub const OFFLINE_USERS_KEY: &str = "offlineUsers";

/// Pending attendance events not yet confirmed by the backend.
pub const OFFLINE_QUEUE_KEY: &str = "offlineQueue";

/// Raw text storage backend.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw text stored under `key`, `None` when absent.
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the raw text stored under `key`.
    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Typed JSON access on top of any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and decode `key`, returning `default` on any failure.
    fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_raw(key) {
            Ok(Some(text)) if !text.trim().is_empty() => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) => {
                    debug!("[Store] Ignoring unparsable value for '{}': {}", key, err);
                    default
                }
            },
            Ok(_) => default,
            Err(err) => {
                debug!("[Store] Read of '{}' failed: {}", key, err);
                default
            }
        }
    }

    /// Encode `value` as JSON and store it under `key`.
    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        self.set_raw(key, &text)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Element of a stored collection that may not decode as `T`.
///
/// Undecodable elements are carried verbatim, so reading one bad element
/// never discards its neighbours and rewriting the collection keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry<T> {
    Decoded(T),
    Raw(serde_json::Value),
}

impl<T> StoredEntry<T> {
    pub fn decoded(&self) -> Option<&T> {
        match self {
            Self::Decoded(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    pub fn into_decoded(self) -> Option<T> {
        match self {
            Self::Decoded(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}
