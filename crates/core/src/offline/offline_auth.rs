//! Local user registry for registering and signing in without the backend.

use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::crypto::{generate_salt, hash_password};
use crate::store::{KeyValueStore, KeyValueStoreExt, StoredEntry, OFFLINE_USERS_KEY};

use super::{OfflineUserRecord, RegisterOutcome, Session, DEFAULT_ROLE};

type UserRegistry = BTreeMap<String, StoredEntry<OfflineUserRecord>>;

/// Offline registration and login against salted password hashes.
///
/// Never touches the network; only the `offlineUsers` registry is mutated.
/// Records that fail to decode stay in the registry and keep their id taken.
#[derive(Clone)]
pub struct OfflineAuthStore {
    store: Arc<dyn KeyValueStore>,
}

impl OfflineAuthStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn users(&self) -> UserRegistry {
        self.store.read_or(OFFLINE_USERS_KEY, UserRegistry::new())
    }

    /// Enroll a user locally. Fails when the enrollment id is already registered.
    pub fn register(&self, name: &str, enrollment_id: &str, password: &str) -> RegisterOutcome {
        let mut users = self.users();
        if users.contains_key(enrollment_id) {
            debug!(
                "[OfflineAuth] Enrollment {} already registered offline",
                enrollment_id
            );
            return RegisterOutcome::failure("Enrollment already exists offline");
        }

        let salt = generate_salt();
        let hash = hash_password(password, &salt);
        users.insert(
            enrollment_id.to_string(),
            StoredEntry::Decoded(OfflineUserRecord {
                name: name.to_string(),
                role: DEFAULT_ROLE.to_string(),
                salt,
                hash,
            }),
        );

        if let Err(err) = self.store.write(OFFLINE_USERS_KEY, &users) {
            warn!("[OfflineAuth] Failed to persist user registry: {}", err);
        }
        info!(
            "[OfflineAuth] Registered enrollment {} offline",
            enrollment_id
        );
        RegisterOutcome::success("Offline registration completed")
    }

    /// Verify credentials against the local registry.
    ///
    /// Unknown enrollment, an unreadable record and a wrong password all
    /// return `None`.
    pub fn login(&self, enrollment_id: &str, password: &str) -> Option<Session> {
        let users = self.users();
        let record = users.get(enrollment_id)?.decoded()?;
        if hash_password(password, &record.salt) != record.hash {
            return None;
        }
        Some(Session::offline(enrollment_id, record))
    }

    /// Whether an enrollment id has a local record.
    pub fn is_registered(&self, enrollment_id: &str) -> bool {
        self.users().contains_key(enrollment_id)
    }
}
