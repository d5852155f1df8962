//! Foundation utilities for marginalia
//!
//! Error taxonomy, tracing setup, secret redaction and atomic writes used by
//! the other workspace crates.

pub mod atomic_write;
pub mod error;
pub mod logging;
pub mod redaction;

pub use atomic_write::write_file_atomic;
pub use error::{ConfigError, ErrorCategory, LlmError, UserFriendlyError};
pub use logging::{init_tracing, init_tracing_json, interview_span};
pub use redaction::redact_secrets;
