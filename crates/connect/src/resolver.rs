//! Startup endpoint discovery.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::endpoint::EndpointState;
use crate::fetch::fetch_with_timeout;
use crate::types::{ApiRequest, ONLINE_PATH};

/// Probes candidate bases in priority order and adopts the first live one.
#[derive(Clone)]
pub struct EndpointResolver {
    http: reqwest::Client,
    endpoints: Arc<EndpointState>,
    probe_timeout: Duration,
}

impl EndpointResolver {
    pub fn new(
        http: reqwest::Client,
        endpoints: Arc<EndpointState>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            probe_timeout,
        }
    }

    /// True when `GET <base>/api/online` answers with a success status in time.
    pub async fn probe(&self, base: &str) -> bool {
        let request = ApiRequest::get(ONLINE_PATH);
        let url = request.url_for(base);
        match fetch_with_timeout(&self.http, &url, &request, self.probe_timeout).await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("[Endpoint] Probe {} answered {}", url, response.status());
                false
            }
            Err(err) => {
                debug!("[Endpoint] Probe {} failed: {}", url, err);
                false
            }
        }
    }

    /// Pick the working base: override, cached base, then static defaults.
    ///
    /// When nothing answers, the first static default is adopted anyway and
    /// requests against it will fail until connectivity returns.
    pub async fn resolve(&self) -> String {
        let candidates = self.endpoints.resolution_candidates();
        for base in &candidates {
            if self.probe(base).await {
                info!("[Endpoint] Resolved API base {}", base);
                self.endpoints.adopt(base);
                return base.clone();
            }
        }

        let fallback = self.endpoints.primary_default();
        warn!(
            "[Endpoint] No reachable API base among {} candidates, falling back to {}",
            candidates.len(),
            fallback
        );
        self.endpoints.adopt(&fallback);
        fallback
    }
}
