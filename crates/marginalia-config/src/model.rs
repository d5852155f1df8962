use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const PROVIDER_ANTHROPIC: &str = "anthropic";
pub const PROVIDER_CLAUDE_CLI: &str = "claude-cli";
pub const SUPPORTED_PROVIDERS: &[&str] = &[PROVIDER_ANTHROPIC, PROVIDER_CLAUDE_CLI];

pub const DEFAULT_PROVIDER: &str = PROVIDER_ANTHROPIC;
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CLI_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MIN_QUESTIONS: u32 = 5;
pub const DEFAULT_MAX_QUESTIONS: u32 = 8;
pub const DEFAULT_AFTER_COMPLETE: &str = "reject";
pub const DEFAULT_OUTPUT_FILE: &str = "product-description.md";

/// Where an effective setting came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env(String),
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env(var) => write!(f, "env:{var}"),
            Self::ConfigFile(path) => write!(f, "config:{}", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}

/// `[llm]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// "anthropic" or "claude-cli"
    pub provider: Option<String>,
    pub claude: Option<ClaudeConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

/// `[llm.claude]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClaudeConfig {
    /// Explicit path to the claude binary; discovery is used when unset
    pub binary: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[llm.anthropic]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// `[interview]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewConfig {
    pub min_questions: Option<u32>,
    pub max_questions: Option<u32>,
    /// "reject" or "reopen"
    pub after_complete: Option<String>,
    /// Hidden first user turn sent when the interview starts
    pub kickoff_message: Option<String>,
    /// Whether the CLI starts the interview without waiting for Enter
    pub auto_start: Option<bool>,
    /// Output file, relative to the project root
    pub output: Option<String>,
}

/// `[logging]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    /// "text" or "json"
    pub format: Option<String>,
}

/// Effective configuration after merging defaults, file and CLI.
///
/// Sections keep their raw `Option` fields; the accessor methods apply
/// built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub llm: LlmConfig,
    pub interview: InterviewConfig,
    pub logging: LoggingConfig,
    pub source_attribution: HashMap<String, ConfigSource>,
    /// File the settings were read from, if any
    pub config_file: Option<PathBuf>,
}

impl Config {
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    #[must_use]
    pub fn claude_binary(&self) -> Option<&str> {
        self.llm.claude.as_ref().and_then(|c| c.binary.as_deref())
    }

    #[must_use]
    pub fn claude_timeout(&self) -> Duration {
        let secs = self
            .llm
            .claude
            .as_ref()
            .and_then(|c| c.timeout_secs)
            .unwrap_or(DEFAULT_CLI_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    fn anthropic(&self) -> Option<&AnthropicConfig> {
        self.llm.anthropic.as_ref()
    }

    #[must_use]
    pub fn anthropic_api_key_env(&self) -> &str {
        self.anthropic()
            .and_then(|a| a.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    #[must_use]
    pub fn anthropic_base_url(&self) -> &str {
        self.anthropic()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_ANTHROPIC_BASE_URL)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.anthropic()
            .and_then(|a| a.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.anthropic()
            .and_then(|a| a.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    #[must_use]
    pub fn anthropic_timeout(&self) -> Duration {
        let secs = self
            .anthropic()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(DEFAULT_ANTHROPIC_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn min_questions(&self) -> u32 {
        self.interview.min_questions.unwrap_or(DEFAULT_MIN_QUESTIONS)
    }

    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.interview.max_questions.unwrap_or(DEFAULT_MAX_QUESTIONS)
    }

    #[must_use]
    pub fn after_complete(&self) -> &str {
        self.interview
            .after_complete
            .as_deref()
            .unwrap_or(DEFAULT_AFTER_COMPLETE)
    }

    #[must_use]
    pub fn kickoff_message(&self) -> Option<&str> {
        self.interview.kickoff_message.as_deref()
    }

    #[must_use]
    pub fn auto_start(&self) -> bool {
        self.interview.auto_start.unwrap_or(true)
    }

    #[must_use]
    pub fn output_file(&self) -> &str {
        self.interview.output.as_deref().unwrap_or(DEFAULT_OUTPUT_FILE)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn log_format(&self) -> &str {
        self.logging.format.as_deref().unwrap_or("text")
    }

    /// A config with nothing set, so every accessor yields its default.
    #[cfg(any(test, feature = "test-utils"))]
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self::default()
    }
}
