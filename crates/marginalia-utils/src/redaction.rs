//! Secret scrubbing for messages that leave the process boundary.
//!
//! Transport failures from the HTTP client can echo request URLs or header
//! values back to us; everything that ends up in a log line or an `Error`
//! event goes through [`redact_secrets`] first.

use once_cell::sync::Lazy;
use regex::Regex;

/// `scheme://user:pass@` prefixes
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s/]+:[^@\s]+@").expect("valid regex"));

/// Anthropic keys carry a recognizable prefix; catch them even when short.
static ANTHROPIC_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sk-ant-[A-Za-z0-9_-]+").expect("valid regex"));

/// Any other opaque token of 32+ key-ish characters
static POTENTIAL_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_-]{32,}").expect("valid regex"));

/// Remove credentials and key-shaped tokens from `message`.
#[must_use]
pub fn redact_secrets(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = ANTHROPIC_KEY.replace_all(&redacted, "[REDACTED_KEY]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "[REDACTED_KEY]");
    redacted.into_owned()
}
