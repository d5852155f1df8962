//! Chat backends for marginalia
//!
//! Two interchangeable implementations of [`ChatBackend`]:
//!
//! * [`AnthropicBackend`] calls the Anthropic Messages API and is stateless,
//!   resending the whole conversation on every call.
//! * [`ClaudeCliBackend`] drives the local `claude` CLI and keeps a
//!   server-side session, sending only the newest user message.
//!
//! [`from_config`] picks one based on `[llm] provider`.

mod anthropic_backend;
mod claude_cli;
pub mod discovery;
mod http_client;
mod types;

pub use anthropic_backend::AnthropicBackend;
pub use claude_cli::ClaudeCliBackend;
pub use marginalia_utils::error::LlmError;
pub use types::{ChatBackend, Role, Turn, latest_user_message};

use marginalia_config::{Config, PROVIDER_ANTHROPIC, PROVIDER_CLAUDE_CLI};
use tracing::info;

/// Construct the backend selected by `config.provider()`.
pub fn from_config(config: &Config) -> Result<Box<dyn ChatBackend>, LlmError> {
    let provider = config.provider();
    let backend: Box<dyn ChatBackend> = match provider {
        PROVIDER_ANTHROPIC => Box::new(AnthropicBackend::new_from_config(config)?),
        PROVIDER_CLAUDE_CLI => {
            let backend = ClaudeCliBackend::new_from_config(config)?;
            info!(binary = %backend.binary_path().display(), "using Claude CLI backend");
            Box::new(backend)
        }
        other => {
            return Err(LlmError::Unsupported(format!(
                "'{other}' (supported: {PROVIDER_ANTHROPIC}, {PROVIDER_CLAUDE_CLI})"
            )));
        }
    };
    Ok(backend)
}
