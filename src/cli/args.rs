//! CLI argument definitions (clap derive)

use clap::{Args, Parser, Subcommand};
use marginalia_config::CliArgs;
use std::path::PathBuf;

/// marginalia - interview-driven product descriptions
#[derive(Parser, Debug)]
#[command(name = "marginalia")]
#[command(about = "Interview a project owner with an LLM and write a product description")]
#[command(long_about = r#"
marginalia asks a handful of questions about a project, one at a time, and then
writes a Markdown product description from the answers.

EXAMPLES:
  # Interview using the Anthropic API (needs ANTHROPIC_API_KEY)
  marginalia interview --name acme --language Rust --description "Inventory service"

  # Use the locally installed claude CLI instead
  marginalia interview --name acme --language Rust --description "..." --provider claude-cli

  # Show which claude binary would be used
  marginalia discover

  # Show the effective configuration and where each value came from
  marginalia config

CONFIGURATION:
  Precedence: CLI flags > MARGINALIA_LLM_PROVIDER > config file > defaults
  The config file is .marginalia/config.toml, searched upward from the current
  directory, or $MARGINALIA_HOME/config.toml. Use --config for an explicit path.

During an interview type /done to get the description immediately and /quit to
leave without writing anything.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// LLM provider: anthropic or claude-cli
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model for the Anthropic API provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path to the claude CLI binary
    #[arg(long, global = true)]
    pub claude_binary: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format: text or json
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive interview and write the product description
    Interview(InterviewArgs),

    /// Print the claude CLI binary that would be used
    Discover {
        /// Check this path first
        #[arg(long)]
        binary: Option<String>,
    },

    /// Print the effective configuration with source attribution
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct InterviewArgs {
    /// Project name
    #[arg(long)]
    pub name: String,

    /// Primary programming language
    #[arg(long)]
    pub language: String,

    /// One-line description of the project
    #[arg(long)]
    pub description: String,

    /// Project root directory (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Where to write the document (default: <root>/product-description.md)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Wait for the first answer instead of letting the assistant open
    #[arg(long)]
    pub no_auto_start: bool,
}

impl Cli {
    /// Overrides for the configuration layer. Flags that were not given stay
    /// `None` so config file values survive.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            provider: self.provider.clone(),
            claude_binary: self.claude_binary.clone(),
            model: self.model.clone(),
            verbose: self.verbose.then_some(true),
            log_format: self.log_format.clone(),
        }
    }
}
