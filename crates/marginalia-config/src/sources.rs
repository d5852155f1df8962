use std::collections::BTreeMap;

use crate::model::Config;

impl Config {
    /// Every effective setting as `key -> (value, source)`, sorted by key.
    ///
    /// Settings nobody touched are reported with source `default`. The API
    /// key itself is never read here, only the name of its variable.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut out = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self
                .source_attribution
                .get(key)
                .map_or_else(|| "default".to_string(), ToString::to_string);
            out.insert(key.to_string(), (value, source));
        };

        add("llm.provider", self.provider().to_string());
        add(
            "llm.claude.binary",
            self.claude_binary().unwrap_or("(auto-discover)").to_string(),
        );
        add(
            "llm.claude.timeout_secs",
            self.claude_timeout().as_secs().to_string(),
        );
        add(
            "llm.anthropic.api_key_env",
            self.anthropic_api_key_env().to_string(),
        );
        add(
            "llm.anthropic.base_url",
            self.anthropic_base_url().to_string(),
        );
        add("llm.anthropic.model", self.model().to_string());
        add("llm.anthropic.max_tokens", self.max_tokens().to_string());
        add(
            "llm.anthropic.timeout_secs",
            self.anthropic_timeout().as_secs().to_string(),
        );
        add("interview.min_questions", self.min_questions().to_string());
        add("interview.max_questions", self.max_questions().to_string());
        add("interview.after_complete", self.after_complete().to_string());
        add(
            "interview.kickoff_message",
            self.kickoff_message().unwrap_or("(none)").to_string(),
        );
        add("interview.auto_start", self.auto_start().to_string());
        add("interview.output", self.output_file().to_string());
        add("logging.verbose", self.verbose().to_string());
        add("logging.format", self.log_format().to_string());

        out
    }
}
