//! Error taxonomy shared by every marginalia crate.
//!
//! Backend failures are surfaced to the interview as `Error` events carrying
//! the `Display` text of an [`LlmError`], so each variant's message is written
//! to stand on its own in front of a user.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for grouping in CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    BackendIntegration,
    ProcessExecution,
    ResourceLimits,
    Conversation,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::BackendIntegration => write!(f, "Backend Integration"),
            Self::ProcessExecution => write!(f, "Process Execution"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Conversation => write!(f, "Conversation"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration validation failed with {error_count} error(s):\n{}", errors.join("\n"))]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl ConfigError {
    /// Collapse a list of validation messages into a single error
    #[must_use]
    pub fn validation(errors: Vec<String>) -> Self {
        let error_count = errors.len();
        Self::ValidationFailed {
            errors,
            error_count,
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Could not read configuration: {msg}"),
            Self::MissingRequired(key) => format!("Required setting '{key}' is missing"),
            Self::InvalidValue { key, value } => format!("Setting '{key}' is invalid: {value}"),
            Self::ValidationFailed { error_count, .. } => {
                format!("Configuration has {error_count} problem(s)")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ValidationFailed { errors, .. } => Some(errors.join("\n")),
            Self::InvalidFile(_) => {
                Some("Configuration is read from .marginalia/config.toml.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Run 'marginalia config' to see the effective configuration and its sources"
                .to_string(),
            "Check .marginalia/config.toml for typos in section or key names".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Failures raised by a chat backend
///
/// `ProcessFailed` comes from the session-resuming CLI backend and the
/// provider variants from HTTP status mapping in the API backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM provider authentication failed: {0}")]
    ProviderAuth(String),

    #[error("LLM provider quota exceeded: {0}")]
    ProviderQuota(String),

    #[error("LLM provider outage: {0}")]
    ProviderOutage(String),

    #[error("Backend call timed out after {}s", duration.as_secs())]
    Timeout { duration: Duration },

    #[error("Claude CLI exited with code {exit_code}: {output}")]
    ProcessFailed { exit_code: i32, output: String },

    #[error("Malformed backend response: {0}")]
    Protocol(String),

    #[error("{0}")]
    Precondition(String),

    #[error("LLM configuration error: {0}")]
    Misconfiguration(String),

    #[error("Unsupported LLM provider: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("The backend could not be reached or the CLI could not be spawned.".into())
            }
            Self::ProviderAuth(_) => {
                Some("The Anthropic API rejected the credentials that were sent.".into())
            }
            Self::Timeout { .. } => Some(
                "The call was abandoned (and any CLI process killed) when its timeout elapsed."
                    .into(),
            ),
            Self::Protocol(_) => Some("The backend answered with an unexpected shape.".into()),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Check network connectivity or that the claude binary runs on its own".into(),
                "Run 'marginalia discover' to see which CLI binary would be used".into(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that ANTHROPIC_API_KEY (or the configured api_key_env) is set".into(),
            ],
            Self::ProviderQuota(_) => vec!["Wait a few minutes and try again".into()],
            Self::Timeout { .. } => {
                vec!["Raise timeout_secs under [llm.claude] or [llm.anthropic]".into()]
            }
            Self::ProcessFailed { .. } => vec![
                "Run the claude CLI by hand to check it is logged in and working".into(),
            ],
            Self::Protocol(_) | Self::Precondition(_) => {
                vec!["Re-run with --verbose to see the raw exchange".into()]
            }
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Set [llm] provider to \"anthropic\" or \"claude-cli\"".into(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Protocol(_) => {
                ErrorCategory::BackendIntegration
            }
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) => ErrorCategory::ResourceLimits,
            Self::Timeout { .. } | Self::ProcessFailed { .. } => ErrorCategory::ProcessExecution,
            Self::Precondition(_) => ErrorCategory::Conversation,
        }
    }
}
