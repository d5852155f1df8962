//! marginalia - interview-driven product descriptions
//!
//! marginalia interviews a project owner through an LLM, asking a few
//! questions one at a time, and ends with a Markdown product description
//! wrapped in `<product-description>` tags.
//!
//! It can be used in two ways:
//! - **CLI**: `marginalia interview --name acme --language Rust --description "..."`
//! - **Library**: build an [`InterviewEngine`] over any [`ChatBackend`] and
//!   consume its [`InterviewEvent`] stream.
//!
//! # Backends
//!
//! - [`AnthropicBackend`]: stateless, resends the whole conversation to the
//!   Anthropic Messages API on every call.
//! - [`ClaudeCliBackend`]: spawns the local `claude` CLI and resumes its
//!   session, sending only the newest user message.
//!
//! Pick one from configuration with [`backend_from_config`].
//!
//! # Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `marginalia-utils` | error taxonomy, tracing setup, redaction, atomic writes |
//! | `marginalia-runner` | bounded process execution |
//! | `marginalia-config` | `.marginalia/config.toml` loading and validation |
//! | `marginalia-llm` | chat backends and claude binary discovery |
//! | `marginalia-interview` | the interview engine |

pub mod cli;
mod error_report;
pub mod exit_codes;
pub mod session;

pub use exit_codes::ExitCode;

pub use marginalia_config::{CliArgs, Config};
pub use marginalia_interview::{
    CompletionPolicy, GENERATE_NOW_PROMPT, InterviewEngine, InterviewError, InterviewEvent,
    InterviewOptions, InterviewState, ProjectMetadata, build_system_prompt,
    extract_product_description,
};
pub use marginalia_llm::{
    AnthropicBackend, ChatBackend, ClaudeCliBackend, LlmError, Role, Turn, discovery,
    from_config as backend_from_config,
};
pub use marginalia_utils::error::{ConfigError, ErrorCategory, UserFriendlyError};
