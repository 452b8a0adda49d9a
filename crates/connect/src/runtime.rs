//! Process-wide entry point wiring the store, endpoint state and services.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::OnceCell;

use punchclock_core::{
    EnqueueOutcome, HistoryEntry, KeyValueStore, OfflineAuthStore, OfflineQueue, PendingEvent,
    RegisterOutcome, Session,
};

use crate::client::ResilientClient;
use crate::config::{override_from_launch_url, ConnectConfig};
use crate::endpoint::EndpointState;
use crate::error::Result;
use crate::resolver::EndpointResolver;
use crate::sync::sync_offline_queue;
use crate::types::{ApiRequest, SyncReport};

/// Punch clock client: endpoint discovery, failover requests and offline mode.
///
/// Endpoint resolution runs at most once per instance, on the first call to
/// [`PunchClock::ready`]. Operations that need a resolved base await it.
pub struct PunchClock {
    endpoints: Arc<EndpointState>,
    resolver: EndpointResolver,
    client: ResilientClient,
    auth: OfflineAuthStore,
    queue: OfflineQueue,
    ready: OnceCell<String>,
}

impl PunchClock {
    /// Build a client with a default HTTP stack.
    pub fn new(config: ConnectConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(config, store, http))
    }

    pub fn with_http_client(
        config: ConnectConfig,
        store: Arc<dyn KeyValueStore>,
        http: reqwest::Client,
    ) -> Self {
        let endpoints = Arc::new(EndpointState::new(Arc::clone(&store), &config));
        let resolver =
            EndpointResolver::new(http.clone(), Arc::clone(&endpoints), config.probe_timeout);
        let client = ResilientClient::new(http, Arc::clone(&endpoints), config.request_timeout);
        Self {
            endpoints,
            resolver,
            client,
            auth: OfflineAuthStore::new(Arc::clone(&store)),
            queue: OfflineQueue::new(store),
            ready: OnceCell::new(),
        }
    }

    /// Build, apply the launch override (if any) and wait for endpoint resolution.
    pub async fn start(
        config: ConnectConfig,
        store: Arc<dyn KeyValueStore>,
        launch_url: Option<&str>,
    ) -> Result<Self> {
        let clock = Self::new(config, store)?;
        if let Some(url) = launch_url {
            clock.apply_launch_url(url);
        }
        let base = clock.ready().await;
        info!("[PunchClock] Ready on {}", base);
        Ok(clock)
    }

    /// Pin the override carried by `?api=` / `?api_base=`, if present.
    pub fn apply_launch_url(&self, launch_url: &str) -> Option<String> {
        let base = override_from_launch_url(launch_url)?;
        debug!("[PunchClock] Launch override {}", base);
        self.endpoints.set_override(&base);
        Some(base)
    }

    /// Resolve the working base once; later calls return the same value.
    pub async fn ready(&self) -> &str {
        self.ready
            .get_or_init(|| async { self.resolver.resolve().await })
            .await
    }

    /// Base chosen by startup resolution, `None` until [`PunchClock::ready`] completes.
    pub fn resolved_base(&self) -> Option<&str> {
        self.ready.get().map(String::as_str)
    }

    /// Base that most recently answered a request.
    pub fn current_base(&self) -> Option<String> {
        self.endpoints.current()
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        self.client.dispatch(request).await
    }

    pub fn set_endpoint_override(&self, url: &str) {
        self.endpoints.set_override(url);
    }

    pub fn clear_endpoint_override(&self) {
        self.endpoints.clear_override();
    }

    /// Whether the backend reports itself online. Waits for startup resolution.
    pub async fn is_available(&self) -> bool {
        self.ready().await;
        self.client.is_available().await
    }

    pub fn register_offline(
        &self,
        name: &str,
        enrollment_id: &str,
        password: &str,
    ) -> RegisterOutcome {
        self.auth.register(name, enrollment_id, password)
    }

    pub fn login_offline(&self, enrollment_id: &str, password: &str) -> Option<Session> {
        self.auth.login(enrollment_id, password)
    }

    pub fn punch_offline(
        &self,
        punch_type: &str,
        neighborhood: &str,
        city: &str,
    ) -> EnqueueOutcome {
        self.queue.enqueue(punch_type, neighborhood, city)
    }

    /// Queued punches from the current month, flagged pending.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.queue.history()
    }

    pub fn pending(&self) -> Vec<PendingEvent> {
        self.queue.pending()
    }

    /// Replay the offline queue once with `token`.
    pub async fn sync(&self, token: &str) -> SyncReport {
        sync_offline_queue(&self.client, &self.queue, token).await
    }

    /// Sign in online when the backend is up, otherwise against the local registry.
    ///
    /// Credentials rejected by a reachable backend are not retried offline.
    pub async fn login(&self, enrollment_id: &str, password: &str) -> Option<Session> {
        if self.is_available().await {
            match self.client.login_online(enrollment_id, password).await {
                Ok(session) => return session,
                Err(err) => warn!("[PunchClock] Online login failed, trying offline: {}", err),
            }
        }
        self.auth.login(enrollment_id, password)
    }

    /// Register online when the backend is up, otherwise in the local registry.
    pub async fn register(
        &self,
        name: &str,
        enrollment_id: &str,
        password: &str,
    ) -> RegisterOutcome {
        if self.is_available().await {
            match self
                .client
                .register_online(name, enrollment_id, password)
                .await
            {
                Ok(outcome) => return outcome,
                Err(err) => warn!(
                    "[PunchClock] Online registration failed, registering offline: {}",
                    err
                ),
            }
        }
        self.auth.register(name, enrollment_id, password)
    }
}
