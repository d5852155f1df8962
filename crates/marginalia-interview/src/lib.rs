//! Interview orchestration for marginalia
//!
//! An [`InterviewEngine`] owns one conversation with one
//! [`ChatBackend`](marginalia_llm::ChatBackend). Callers fire triggers and
//! observe progress through a broadcast stream of [`InterviewEvent`]s. The
//! interview ends when the assistant emits a `<product-description>` block.
//!
//! ```no_run
//! use std::sync::Arc;
//! use marginalia_interview::{InterviewEngine, InterviewEvent, InterviewOptions, ProjectMetadata};
//! use marginalia_llm::AnthropicBackend;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let backend = Arc::new(AnthropicBackend::new("sk-ant-...")?);
//! let metadata = ProjectMetadata::new("demo", ".", "Rust", "A demo project");
//! let engine = InterviewEngine::new(backend, metadata, InterviewOptions::default())?;
//! let mut events = engine.subscribe();
//! engine.start()?;
//! while let Ok(event) = events.recv().await {
//!     if let InterviewEvent::Complete(doc) = event {
//!         println!("{doc}");
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod extraction;
pub mod metadata;
pub mod options;
pub mod prompt;

pub use engine::{InterviewEngine, InterviewState};
pub use error::InterviewError;
pub use event::InterviewEvent;
pub use extraction::extract_product_description;
pub use metadata::ProjectMetadata;
pub use options::{CompletionPolicy, DEFAULT_EVENT_CAPACITY, InterviewOptions};
pub use prompt::{GENERATE_NOW_PROMPT, build_system_prompt};
