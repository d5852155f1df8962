use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::cli_args::CliArgs;
use crate::model::{
    AnthropicConfig, ClaudeConfig, Config, ConfigSource, InterviewConfig, LlmConfig,
    LoggingConfig,
};

/// Directory holding the per-project config file
pub const CONFIG_DIR: &str = ".marginalia";
pub const CONFIG_FILE: &str = "config.toml";
/// Fallback directory searched when no project config exists
pub const HOME_ENV: &str = "MARGINALIA_HOME";
/// Provider override that sits between the file and the CLI flag
pub const PROVIDER_ENV: &str = "MARGINALIA_LLM_PROVIDER";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<LlmConfig>,
    interview: Option<InterviewConfig>,
    logging: Option<LoggingConfig>,
}

/// Copy `value` into `slot` when present, recording where it came from.
fn apply<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(v) = value {
        *slot = Some(v);
        attribution.insert(key.to_string(), source.clone());
    }
}

impl Config {
    /// Discover configuration for the current directory.
    ///
    /// Search order for the file: `--config`, then `.marginalia/config.toml`
    /// walking up to the repository root, then `$MARGINALIA_HOME/config.toml`.
    /// Precedence of values: CLI > `MARGINALIA_LLM_PROVIDER` > file > defaults.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        let home = env::var_os(HOME_ENV).map(PathBuf::from);
        let env_provider = env::var(PROVIDER_ENV).ok().filter(|p| !p.trim().is_empty());
        Self::discover_with(&start_dir, home.as_deref(), env_provider, cli_args)
    }

    /// Like [`Config::discover`] but rooted at `start_dir` and ignoring the
    /// environment, which keeps tests hermetic.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with(start_dir, None, None, cli_args)
    }

    /// Build a configuration from TOML text, e.g. for embedding or tests.
    pub fn from_toml_str(content: &str, cli_args: &CliArgs) -> Result<Self> {
        let file: TomlConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        let mut config = Self::default();
        config.merge_file(file, &ConfigSource::Programmatic);
        config.merge_overrides(None, cli_args);
        config.validate()?;
        Ok(config)
    }

    fn discover_with(
        start_dir: &Path,
        home: Option<&Path>,
        env_provider: Option<String>,
        cli_args: &CliArgs,
    ) -> Result<Self> {
        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?.or_else(|| {
                home.map(|h| h.join(CONFIG_FILE))
                    .filter(|candidate| candidate.is_file())
            }),
        };

        let mut config = Self::default();
        if let Some(path) = &config_path {
            let file = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.merge_file(file, &ConfigSource::ConfigFile(path.clone()));
            config.config_file = Some(path.clone());
        }
        config.merge_overrides(env_provider, cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Walk upward from `start_dir` looking for `.marginalia/config.toml`,
    /// stopping at the first directory that looks like a repository root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
            if [".git", ".hg", ".svn"]
                .iter()
                .any(|marker| dir.join(marker).exists())
            {
                break;
            }
            current = dir.parent();
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config file: {}", path.display())),
            // An explicit --config that does not exist yet behaves like an empty file.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }

    fn merge_file(&mut self, file: TomlConfig, source: &ConfigSource) {
        let attr = &mut self.source_attribution;

        if let Some(llm) = file.llm {
            apply(&mut self.llm.provider, llm.provider, "llm.provider", source, attr);

            if let Some(claude) = llm.claude {
                let target = self.llm.claude.get_or_insert_with(ClaudeConfig::default);
                apply(&mut target.binary, claude.binary, "llm.claude.binary", source, attr);
                apply(
                    &mut target.timeout_secs,
                    claude.timeout_secs,
                    "llm.claude.timeout_secs",
                    source,
                    attr,
                );
            }

            if let Some(anthropic) = llm.anthropic {
                let target = self
                    .llm
                    .anthropic
                    .get_or_insert_with(AnthropicConfig::default);
                apply(
                    &mut target.api_key_env,
                    anthropic.api_key_env,
                    "llm.anthropic.api_key_env",
                    source,
                    attr,
                );
                apply(
                    &mut target.base_url,
                    anthropic.base_url,
                    "llm.anthropic.base_url",
                    source,
                    attr,
                );
                apply(&mut target.model, anthropic.model, "llm.anthropic.model", source, attr);
                apply(
                    &mut target.max_tokens,
                    anthropic.max_tokens,
                    "llm.anthropic.max_tokens",
                    source,
                    attr,
                );
                apply(
                    &mut target.timeout_secs,
                    anthropic.timeout_secs,
                    "llm.anthropic.timeout_secs",
                    source,
                    attr,
                );
            }
        }

        if let Some(interview) = file.interview {
            let target = &mut self.interview;
            apply(
                &mut target.min_questions,
                interview.min_questions,
                "interview.min_questions",
                source,
                attr,
            );
            apply(
                &mut target.max_questions,
                interview.max_questions,
                "interview.max_questions",
                source,
                attr,
            );
            apply(
                &mut target.after_complete,
                interview.after_complete,
                "interview.after_complete",
                source,
                attr,
            );
            apply(
                &mut target.kickoff_message,
                interview.kickoff_message,
                "interview.kickoff_message",
                source,
                attr,
            );
            apply(
                &mut target.auto_start,
                interview.auto_start,
                "interview.auto_start",
                source,
                attr,
            );
            apply(&mut target.output, interview.output, "interview.output", source, attr);
        }

        if let Some(logging) = file.logging {
            apply(
                &mut self.logging.verbose,
                logging.verbose,
                "logging.verbose",
                source,
                attr,
            );
            apply(&mut self.logging.format, logging.format, "logging.format", source, attr);
        }
    }

    fn merge_overrides(&mut self, env_provider: Option<String>, cli_args: &CliArgs) {
        let attr = &mut self.source_attribution;

        apply(
            &mut self.llm.provider,
            env_provider,
            "llm.provider",
            &ConfigSource::Env(PROVIDER_ENV.to_string()),
            attr,
        );

        let cli = ConfigSource::Cli;
        apply(
            &mut self.llm.provider,
            cli_args.provider.clone(),
            "llm.provider",
            &cli,
            attr,
        );
        if cli_args.claude_binary.is_some() {
            let target = self.llm.claude.get_or_insert_with(ClaudeConfig::default);
            apply(
                &mut target.binary,
                cli_args.claude_binary.clone(),
                "llm.claude.binary",
                &cli,
                attr,
            );
        }
        if cli_args.model.is_some() {
            let target = self
                .llm
                .anthropic
                .get_or_insert_with(AnthropicConfig::default);
            apply(
                &mut target.model,
                cli_args.model.clone(),
                "llm.anthropic.model",
                &cli,
                attr,
            );
        }
        apply(
            &mut self.logging.verbose,
            cli_args.verbose,
            "logging.verbose",
            &cli,
            attr,
        );
        apply(
            &mut self.logging.format,
            cli_args.log_format.clone(),
            "logging.format",
            &cli,
            attr,
        );
    }
}
