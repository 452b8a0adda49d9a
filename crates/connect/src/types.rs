//! Request and response types for the punch clock backend API.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use punchclock_core::PendingEvent;

use crate::error::{ConnectError, Result};

/// Liveness probe path.
pub const ONLINE_PATH: &str = "/api/online";
pub const PUNCH_PATH: &str = "/api/punch";
pub const LOGIN_PATH: &str = "/api/login";
pub const REGISTER_PATH: &str = "/api/register";

/// Base-relative request that can be replayed against several candidate bases.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            method,
            path,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body and the matching content type.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Attach `Authorization: Bearer <token>`.
    pub fn bearer(mut self, token: &str) -> Result<Self> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ConnectError::auth("Invalid access token format"))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Absolute URL of this request against `base`.
    pub fn url_for(&self, base: &str) -> String {
        format!("{}{}", base, self.path)
    }
}

/// Body of `GET /api/online`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub db_online: Option<bool>,
}

/// Body of `POST /api/punch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchRequest {
    #[serde(rename = "type")]
    pub punch_type: String,
    pub neighborhood: String,
    pub city: String,
}

impl From<&PendingEvent> for PunchRequest {
    fn from(event: &PendingEvent) -> Self {
        Self {
            punch_type: event.punch_type.clone(),
            neighborhood: event.neighborhood.clone(),
            city: event.city.clone(),
        }
    }
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub matricula: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub matricula: &'a str,
    pub password: &'a str,
}

/// Error payload returned by the backend (`{"message": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: String,
}

/// Result of one reconciliation pass over the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub migrated: usize,
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_gets_leading_slash() {
        let request = ApiRequest::get("api/online");
        assert_eq!(request.path, "/api/online");
        assert_eq!(
            request.url_for("http://localhost:5005"),
            "http://localhost:5005/api/online"
        );
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = ApiRequest::post(PUNCH_PATH)
            .json(&PunchRequest {
                punch_type: "in".to_string(),
                neighborhood: "Centro".to_string(),
                city: "SP".to_string(),
            })
            .unwrap();
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = request.body.as_deref().unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "in", "neighborhood": "Centro", "city": "SP"})
        );
    }

    #[test]
    fn bearer_rejects_header_breaking_tokens() {
        assert!(ApiRequest::post(PUNCH_PATH).bearer("abc\r\nx: y").is_err());
        let request = ApiRequest::post(PUNCH_PATH).bearer("abc").unwrap();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn online_status_tolerates_missing_fields() {
        let status: OnlineStatus = serde_json::from_str(r#"{"online":true}"#).unwrap();
        assert!(status.online);
        assert_eq!(status.db_online, None);

        let status: OnlineStatus = serde_json::from_str(r#"{"db_online":false}"#).unwrap();
        assert!(!status.online);
    }
}
