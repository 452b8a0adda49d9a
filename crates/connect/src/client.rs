//! Failover API client for the punch clock backend.

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use punchclock_core::{RegisterOutcome, Session};

use crate::endpoint::EndpointState;
use crate::error::{ConnectError, Result};
use crate::fetch::fetch_with_timeout;
use crate::types::{
    ApiErrorResponse, ApiRequest, LoginRequest, OnlineStatus, RegisterRequest, LOGIN_PATH,
    ONLINE_PATH, REGISTER_PATH,
};

const MAX_LOG_BODY_CHARS: usize = 512;

/// Client that walks the candidate bases until one answers.
///
/// Any HTTP response, including error statuses, means the server is reachable:
/// that base is adopted and the response returned as-is. Only connection
/// failures and timeouts move on to the next candidate.
#[derive(Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    endpoints: Arc<EndpointState>,
    request_timeout: Duration,
}

impl ResilientClient {
    pub fn new(
        http: reqwest::Client,
        endpoints: Arc<EndpointState>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            request_timeout,
        }
    }

    pub fn endpoints(&self) -> &Arc<EndpointState> {
        &self.endpoints
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Convert a non-success body into an [`ConnectError::Api`].
    fn api_error(status: reqwest::StatusCode, body: &str) -> ConnectError {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(error) if !error.message.is_empty() => {
                ConnectError::api(status.as_u16(), error.message)
            }
            _ => ConnectError::api(status.as_u16(), format!("Request failed: {}", body)),
        }
    }

    /// Send `request` to the first candidate base that answers.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let candidates = self.endpoints.dispatch_candidates();
        let mut attempts = 0usize;

        for base in &candidates {
            attempts += 1;
            let url = request.url_for(base);
            match fetch_with_timeout(&self.http, &url, request, self.request_timeout).await {
                Ok(response) => {
                    if self.endpoints.current().as_deref() != Some(base.as_str()) {
                        info!(
                            "[PunchClock] {} {} answered by {} after {} attempt(s)",
                            request.method, request.path, base, attempts
                        );
                    }
                    self.endpoints.adopt(base);
                    return Ok(response);
                }
                Err(err) => {
                    debug!(
                        "[PunchClock] {} {} failed on {}: {}",
                        request.method, request.path, base, err
                    );
                }
            }
        }

        warn!(
            "[PunchClock] {} {} failed on all {} candidate bases",
            request.method, request.path, attempts
        );
        Err(ConnectError::Unavailable { attempts })
    }

    /// Dispatch and decode a JSON success body.
    async fn dispatch_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.dispatch(request).await?;
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::api_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Body of `GET /api/online` from whichever base answers.
    ///
    /// The body is read whatever the status, so a backend answering
    /// `503 {"online":true}` still counts as online.
    pub async fn online_status(&self) -> Result<OnlineStatus> {
        let response = self.dispatch(&ApiRequest::get(ONLINE_PATH)).await?;
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        match serde_json::from_str::<OnlineStatus>(&body) {
            Ok(online) => Ok(online),
            Err(_) if !status.is_success() => Err(Self::api_error(status, &body)),
            Err(err) => Err(err.into()),
        }
    }

    /// `online` flag of the liveness endpoint; any failure reads as offline.
    pub async fn is_available(&self) -> bool {
        match self.online_status().await {
            Ok(status) => status.online,
            Err(err) => {
                debug!("[PunchClock] Backend not available: {}", err);
                false
            }
        }
    }

    /// Sign in against the backend.
    ///
    /// Rejected credentials (401) return `Ok(None)`; other failures are errors.
    pub async fn login_online(
        &self,
        enrollment_id: &str,
        password: &str,
    ) -> Result<Option<Session>> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            matricula: enrollment_id,
            password,
        })?;
        match self.dispatch_json::<Session>(&request).await {
            Ok(session) => Ok(Some(session)),
            Err(ConnectError::Api { status: 401, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Register a user on the backend. A duplicate enrollment (409) is a failed outcome.
    pub async fn register_online(
        &self,
        name: &str,
        enrollment_id: &str,
        password: &str,
    ) -> Result<RegisterOutcome> {
        let request = ApiRequest::post(REGISTER_PATH).json(&RegisterRequest {
            name,
            matricula: enrollment_id,
            password,
        })?;
        let response = self.dispatch(&request).await?;
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|payload| payload.message)
            .unwrap_or_default();
        if status.is_success() {
            return Ok(RegisterOutcome::success(message));
        }
        if status.as_u16() == 409 {
            return Ok(RegisterOutcome::failure(message));
        }
        Err(Self::api_error(status, &body))
    }
}
