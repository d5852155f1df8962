//! Tracing setup for the marginalia binary.
//!
//! Library crates only emit events; installing a subscriber is the job of the
//! binary, which calls [`init_tracing`] (or [`init_tracing_json`]) once.
//! Output goes to stderr so the interview transcript on stdout stays clean.

use std::io::IsTerminal;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Colored output only when stderr is a terminal and NO_COLOR is unset.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Filter used when `RUST_LOG` is not set.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("marginalia=debug,info")
            } else {
                EnvFilter::try_new("marginalia=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize a human-readable subscriber.
///
/// `verbose` switches marginalia targets to debug and adds targets to each
/// line. Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_color())
                .with_target(verbose)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

/// Initialize a JSON-lines subscriber for machine consumption.
pub fn init_tracing_json(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init()?;
    Ok(())
}

/// Span wrapping one interview; every backend call is logged inside it.
#[must_use]
pub fn interview_span(project: &str, provider: &str) -> Span {
    tracing::info_span!("interview", project = %project, provider = %provider)
}
