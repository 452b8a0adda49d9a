//! Deadline-bounded HTTP requests.

use log::debug;
use std::time::Duration;

use crate::error::{ConnectError, Result};
use crate::types::ApiRequest;

/// Send `request` to `url`, failing with [`ConnectError::Timeout`] if no
/// response arrives within `timeout`.
///
/// On timeout the in-flight request future is dropped, which aborts the
/// connection. A response that arrives first cancels the deadline.
pub async fn fetch_with_timeout(
    client: &reqwest::Client,
    url: &str,
    request: &ApiRequest,
    timeout: Duration,
) -> Result<reqwest::Response> {
    let mut builder = client
        .request(request.method.clone(), url)
        .headers(request.headers.clone());
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    match tokio::time::timeout(timeout, builder.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => {
            debug!("[Fetch] {} {} failed: {}", request.method, url, err);
            Err(ConnectError::Http(err))
        }
        Err(_) => {
            debug!(
                "[Fetch] {} {} timed out after {:?}",
                request.method, url, timeout
            );
            Err(ConnectError::timeout(url, timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port, test_http_client, MockOutcome, MockServer};

    #[tokio::test]
    async fn returns_response_before_deadline() {
        let server = MockServer::start(vec![MockOutcome::json(200, r#"{"online":true}"#)]).await;
        let client = test_http_client();

        let response = fetch_with_timeout(
            &client,
            &format!("{}/api/online", server.base_url),
            &ApiRequest::get("/api/online"),
            Duration::from_millis(2_000),
        )
        .await
        .expect("response");

        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn error_status_is_still_a_response() {
        let server = MockServer::start(vec![MockOutcome::json(500, r#"{"message":"boom"}"#)]).await;
        let client = test_http_client();

        let response = fetch_with_timeout(
            &client,
            &format!("{}/api/punch", server.base_url),
            &ApiRequest::post("/api/punch"),
            Duration::from_millis(2_000),
        )
        .await
        .expect("response");

        assert_eq!(response.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start(vec![MockOutcome::delayed(200, "{}", 1_000)]).await;
        let client = test_http_client();

        let started = std::time::Instant::now();
        let err = fetch_with_timeout(
            &client,
            &format!("{}/api/online", server.base_url),
            &ApiRequest::get("/api/online"),
            Duration::from_millis(100),
        )
        .await
        .expect_err("timeout");

        assert!(matches!(err, ConnectError::Timeout { timeout_ms: 100, .. }));
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn refused_connection_is_http_error() {
        let client = test_http_client();
        let dead = closed_port();

        let err = fetch_with_timeout(
            &client,
            &format!("{}/api/online", dead.base_url),
            &ApiRequest::get("/api/online"),
            Duration::from_millis(2_000),
        )
        .await
        .expect_err("connection refused");

        assert!(matches!(err, ConnectError::Http(_)));
        assert!(err.is_network());
    }
}
