//! Configuration for marginalia
//!
//! Hierarchical configuration with precedence CLI > environment > file >
//! defaults. The file is `.marginalia/config.toml`, discovered by walking up
//! from the working directory to the repository root:
//!
//! ```toml
//! [llm]
//! provider = "claude-cli"        # or "anthropic"
//!
//! [llm.claude]
//! binary = "/opt/claude/bin/claude"
//! timeout_secs = 120
//!
//! [llm.anthropic]
//! api_key_env = "ANTHROPIC_API_KEY"
//! model = "claude-sonnet-4-20250514"
//! max_tokens = 4096
//!
//! [interview]
//! max_questions = 8
//! after_complete = "reject"      # or "reopen"
//! ```

mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR, CONFIG_FILE, HOME_ENV, PROVIDER_ENV};
pub use model::*;
