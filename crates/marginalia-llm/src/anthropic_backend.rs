//! Stateless backend for Anthropic's Messages API.
//!
//! Every call sends the system prompt plus the full history; nothing is
//! remembered between calls.

use crate::http_client::HttpClient;
use crate::types::{ChatBackend, Role, Turn};
use async_trait::async_trait;
use marginalia_config::Config;
use marginalia_config::{DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use marginalia_utils::error::LlmError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AnthropicBackend {
    /// Backend with the default endpoint, model and token limit.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read the key from the configured environment variable and apply
    /// `[llm.anthropic]` settings.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let key_env = config.anthropic_api_key_env();
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Anthropic API key not found in environment variable '{key_env}'. \
                     Set it or point [llm.anthropic] api_key_env at another variable."
                ))
            })?;

        Ok(Self::new(api_key)?
            .with_base_url(config.anthropic_base_url())
            .with_model(config.model())
            .with_max_tokens(config.max_tokens())
            .with_timeout(config.anthropic_timeout()))
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        history: &'a [Turn],
    ) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: Some(system_prompt).filter(|s| !s.trim().is_empty()),
            messages: history
                .iter()
                .map(|turn| AnthropicMessage {
                    role: turn.role(),
                    content: turn.text(),
                })
                .collect(),
        }
    }

    /// Concatenate the text blocks of a response, in order.
    fn extract_text(response: &AnthropicResponse) -> Result<String, LlmError> {
        let text: String = response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(LlmError::Protocol(
                "Anthropic response contained no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    async fn chat(&self, system_prompt: &str, history: &[Turn]) -> Result<String, LlmError> {
        debug!(
            provider = "anthropic",
            model = %self.model,
            max_tokens = self.max_tokens,
            turns = history.len(),
            timeout_secs = self.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let body = self.build_request(system_prompt, history);
        let request = self
            .client
            .client()
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self.client.send(request, self.timeout, "anthropic").await?;
        let parsed: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Protocol(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let text = Self::extract_text(&parsed)?;
        debug!(
            provider = "anthropic",
            stop_reason = ?parsed.stop_reason,
            tokens_input = parsed.usage.as_ref().map(|u| u.input_tokens),
            tokens_output = parsed.usage.as_ref().map(|u| u.output_tokens),
            "Anthropic invocation completed"
        );
        Ok(text)
    }

    fn provider(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
