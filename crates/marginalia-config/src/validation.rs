use marginalia_utils::error::ConfigError;

use crate::model::{Config, SUPPORTED_PROVIDERS};

impl Config {
    /// Check cross-field constraints, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let provider = self.provider();
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            errors.push(format!(
                "llm.provider '{provider}' is not supported (expected one of: {})",
                SUPPORTED_PROVIDERS.join(", ")
            ));
        }

        if let Some(binary) = self.claude_binary()
            && binary.trim().is_empty()
        {
            errors.push("llm.claude.binary must not be empty when set".to_string());
        }
        if self.claude_timeout().is_zero() {
            errors.push("llm.claude.timeout_secs must be greater than 0".to_string());
        }

        if self.anthropic_api_key_env().trim().is_empty() {
            errors.push("llm.anthropic.api_key_env must not be empty".to_string());
        }
        let base_url = self.anthropic_base_url();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            errors.push(format!(
                "llm.anthropic.base_url '{base_url}' must start with http:// or https://"
            ));
        }
        if self.model().trim().is_empty() {
            errors.push("llm.anthropic.model must not be empty".to_string());
        }
        if self.max_tokens() == 0 {
            errors.push("llm.anthropic.max_tokens must be greater than 0".to_string());
        }
        if self.anthropic_timeout().is_zero() {
            errors.push("llm.anthropic.timeout_secs must be greater than 0".to_string());
        }

        let (min, max) = (self.min_questions(), self.max_questions());
        if min == 0 {
            errors.push("interview.min_questions must be at least 1".to_string());
        }
        if min > max {
            errors.push(format!(
                "interview.min_questions ({min}) must not exceed interview.max_questions ({max})"
            ));
        }
        if !matches!(self.after_complete(), "reject" | "reopen") {
            errors.push(format!(
                "interview.after_complete '{}' must be \"reject\" or \"reopen\"",
                self.after_complete()
            ));
        }
        if let Some(kickoff) = self.kickoff_message()
            && kickoff.trim().is_empty()
        {
            errors.push("interview.kickoff_message must not be blank when set".to_string());
        }
        if self.output_file().trim().is_empty() {
            errors.push("interview.output must not be empty".to_string());
        }

        if !matches!(self.log_format(), "text" | "json") {
            errors.push(format!(
                "logging.format '{}' must be \"text\" or \"json\"",
                self.log_format()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::validation(errors))
        }
    }
}
