//! User-facing error reports for the CLI.

use marginalia_utils::error::{ConfigError, LlmError, UserFriendlyError};
use marginalia_utils::redact_secrets;

/// Message, context and suggestions for `err`, redacted.
///
/// ```text
/// ✗ Configuration error during interview: <message>
///
///   Context: <context>
///
///   Suggestions:
///     • <suggestion>
/// ```
#[must_use]
pub fn contextual_report(err: &dyn UserFriendlyError, operation: &str) -> String {
    let mut out = format!(
        "✗ {} error during {operation}: {}\n",
        err.category(),
        err.user_message()
    );

    if let Some(context) = err.context() {
        out.push_str(&format!("\n  Context: {context}\n"));
    }

    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        out.push_str("\n  Suggestions:\n");
        for suggestion in suggestions {
            out.push_str(&format!("    • {suggestion}\n"));
        }
    }

    redact_secrets(&out)
}

/// Report an `anyhow` error, using the structured report when a known error
/// type is somewhere in the chain.
#[must_use]
pub fn report_anyhow(err: &anyhow::Error, operation: &str) -> String {
    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        return contextual_report(config_err, operation);
    }
    if let Some(llm_err) = err.downcast_ref::<LlmError>() {
        return contextual_report(llm_err, operation);
    }

    let chain = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    redact_secrets(&format!(
        "✗ Error during {operation}: {chain}\n\n  Run with --verbose for more detail.\n"
    ))
}
