//! Shared HTTP plumbing for the sources.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::error::{CalBusError, CalBusResult};

const USER_AGENT: &str = concat!("calbus/", env!("CARGO_PKG_VERSION"));

/// A `reqwest` client with the configured fetch timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> CalBusResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CalBusError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpClient { client, timeout })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request and reject non-2xx responses.
    pub async fn send(&self, request: RequestBuilder) -> CalBusResult<Response> {
        let response = request.send().await.map_err(|e| self.request_error(e))?;
        check_status(response.status(), response.url().as_str())?;
        Ok(response)
    }

    /// Send a request and read the body as text.
    pub async fn text(&self, request: RequestBuilder) -> CalBusResult<String> {
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| self.request_error(e))
    }

    fn request_error(&self, err: reqwest::Error) -> CalBusError {
        if err.is_timeout() {
            CalBusError::Timeout(self.timeout.as_secs())
        } else {
            CalBusError::Fetch(err.without_url().to_string())
        }
    }
}

/// Map an HTTP status onto the error taxonomy.
///
/// 401 and 403 mean the credentials need attention; anything else outside
/// 2xx is a transient fetch failure.
pub fn check_status(status: StatusCode, url: &str) -> CalBusResult<()> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CalBusError::Auth(format!(
            "HTTP {} from {}",
            status.as_u16(),
            redact(url)
        ))),
        _ => Err(CalBusError::HttpStatus {
            status: status.as_u16(),
            url: redact(url),
        }),
    }
}

/// Drop the query string, which may carry tokens or secret feed keys.
fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert!(check_status(StatusCode::OK, "https://example.com").is_ok());
        assert!(check_status(StatusCode::MULTI_STATUS, "https://example.com").is_ok());
    }

    #[test]
    fn test_auth_statuses() {
        let err = check_status(StatusCode::UNAUTHORIZED, "https://example.com/cal").unwrap_err();
        assert!(err.is_auth());
        let err = check_status(StatusCode::FORBIDDEN, "https://example.com/cal").unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_other_errors_hide_query() {
        let err = check_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "https://example.com/feed.ics?key=secret",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com/feed.ics");
        assert!(!err.is_auth());
    }
}
