//! Shared HTTP plumbing for API backends.
//!
//! Each call is a single attempt: no retries. Non-2xx responses are mapped
//! onto the [`LlmError`] taxonomy and every message that may contain request
//! details passes through secret redaction.

use marginalia_utils::error::LlmError;
use marginalia_utils::redaction::redact_secrets;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    max_timeout: Duration,
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
        })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Send `request` once and return the response if it was a 2xx.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<Response, LlmError> {
        let effective = timeout.min(self.max_timeout);
        let response = request
            .timeout(effective)
            .send()
            .await
            .map_err(|e| map_send_error(&e, effective, provider))?;

        let status = response.status();
        debug!(provider, status = status.as_u16(), "HTTP response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = api_error_detail(&body);
        let error = if status.is_server_error() {
            map_server_error(status, provider, detail.as_deref())
        } else {
            map_client_error(status, provider, detail.as_deref())
        };
        warn!(provider, status = status.as_u16(), error = %error, "HTTP call failed");
        Err(error)
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pull `error.message` out of an API error body, redacted.
fn api_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| redact_secrets(&envelope.error.message))
}

fn with_detail(base: String, detail: Option<&str>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!("{base}: {d}"),
        _ => base,
    }
}

fn map_send_error(error: &reqwest::Error, timeout: Duration, provider: &str) -> LlmError {
    if error.is_timeout() {
        return LlmError::Timeout { duration: timeout };
    }
    LlmError::Transport(format!(
        "{provider} request failed: {}",
        redact_secrets(&error.to_string())
    ))
}

fn map_client_error(status: StatusCode, provider: &str, detail: Option<&str>) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(with_detail(
            format!("{provider} authentication failed: {status}"),
            detail,
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(with_detail(
            format!("{provider} rate limit exceeded: {status}"),
            detail,
        )),
        _ => LlmError::Transport(with_detail(
            format!("{provider} returned client error: {status}"),
            detail,
        )),
    }
}

fn map_server_error(status: StatusCode, provider: &str, detail: Option<&str>) -> LlmError {
    LlmError::ProviderOutage(with_detail(
        format!("{provider} returned server error: {status}"),
        detail,
    ))
}
