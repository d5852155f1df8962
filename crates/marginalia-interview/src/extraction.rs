//! Recognizing the finished document inside an assistant reply.

use once_cell::sync::Lazy;
use regex::Regex;

pub const OPEN_TAG: &str = "<product-description>";
pub const CLOSE_TAG: &str = "</product-description>";

// Leftmost opening tag, shortest interior up to the next closing tag.
static DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<product-description>(.*?)</product-description>").expect("valid regex")
});

/// Trimmed interior of the first complete tag pair in `text`, if any.
#[must_use]
pub fn extract_product_description(text: &str) -> Option<String> {
    DESCRIPTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|interior| interior.as_str().trim().to_string())
}
