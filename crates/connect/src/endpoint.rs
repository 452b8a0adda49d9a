//! Shared endpoint state: override, last successful base and cached base.

use log::{debug, info, warn};
use std::sync::{Arc, RwLock};

use punchclock_core::store::{API_BASE_KEY, API_OVERRIDE_KEY};
use punchclock_core::{KeyValueStore, KeyValueStoreExt};

use crate::config::{normalize_base, ConnectConfig, DEFAULT_API_CANDIDATES};

fn push_unique(list: &mut Vec<String>, base: Option<String>) {
    if let Some(base) = base {
        if !base.is_empty() && !list.contains(&base) {
            list.push(base);
        }
    }
}

/// Endpoint context shared by the resolver and the API client.
///
/// The in-memory base is written only through [`EndpointState::adopt`] and the
/// override setters; the override and cached base live in the store so they
/// survive restarts.
pub struct EndpointState {
    store: Arc<dyn KeyValueStore>,
    defaults: Vec<String>,
    last_good: RwLock<Option<String>>,
}

impl EndpointState {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &ConnectConfig) -> Self {
        Self {
            store,
            defaults: config.candidates().to_vec(),
            last_good: RwLock::new(None),
        }
    }

    /// Persisted endpoint override, if any.
    pub fn override_base(&self) -> Option<String> {
        self.store
            .read_or::<Option<String>>(API_OVERRIDE_KEY, None)
            .map(|base| normalize_base(&base))
            .filter(|base| !base.is_empty())
    }

    /// Persisted last-known-good base, if any.
    pub fn cached_base(&self) -> Option<String> {
        self.store
            .read_or::<Option<String>>(API_BASE_KEY, None)
            .map(|base| normalize_base(&base))
            .filter(|base| !base.is_empty())
    }

    /// Base that most recently answered in this process.
    pub fn current(&self) -> Option<String> {
        self.last_good
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// First static default, used when no candidate answers during resolution.
    pub fn primary_default(&self) -> String {
        self.defaults
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_CANDIDATES[0].to_string())
    }

    /// Record `base` as the working endpoint, in memory and in the store.
    pub fn adopt(&self, base: &str) {
        let base = normalize_base(base);
        let changed = {
            let mut guard = self
                .last_good
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let changed = guard.as_deref() != Some(base.as_str());
            *guard = Some(base.clone());
            changed
        };
        if changed {
            info!("[Endpoint] Using API base {}", base);
        }
        if self.cached_base().as_deref() != Some(base.as_str()) {
            if let Err(err) = self.store.write(API_BASE_KEY, &base) {
                warn!("[Endpoint] Failed to persist API base: {}", err);
            }
        }
    }

    /// Pin `url` as the override and working endpoint.
    pub fn set_override(&self, url: &str) {
        let base = normalize_base(url);
        if base.is_empty() {
            warn!("[Endpoint] Ignoring empty endpoint override");
            return;
        }
        if let Err(err) = self.store.write(API_OVERRIDE_KEY, &base) {
            warn!("[Endpoint] Failed to persist endpoint override: {}", err);
        }
        self.adopt(&base);
    }

    /// Drop the override. The cached and in-memory bases are kept.
    pub fn clear_override(&self) {
        if let Err(err) = self.store.remove(API_OVERRIDE_KEY) {
            warn!("[Endpoint] Failed to clear endpoint override: {}", err);
        }
        debug!("[Endpoint] Endpoint override cleared");
    }

    /// Probe order for startup resolution: override, cached base, defaults.
    pub fn resolution_candidates(&self) -> Vec<String> {
        let mut list = Vec::new();
        push_unique(&mut list, self.override_base());
        push_unique(&mut list, self.cached_base());
        for base in &self.defaults {
            push_unique(&mut list, Some(base.clone()));
        }
        list
    }

    /// Try order for a request: override, in-memory base, cached base, defaults.
    pub fn dispatch_candidates(&self) -> Vec<String> {
        let mut list = Vec::new();
        push_unique(&mut list, self.override_base());
        push_unique(&mut list, self.current());
        push_unique(&mut list, self.cached_base());
        for base in &self.defaults {
            push_unique(&mut list, Some(base.clone()));
        }
        list
    }
}
