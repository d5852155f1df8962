//! Terminal session loop against a scripted backend.

use async_trait::async_trait;
use marginalia::session::{SessionOutcome, run_session};
use marginalia::{
    ChatBackend, InterviewEngine, InterviewOptions, LlmError, ProjectMetadata, Turn,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Scripted {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatBackend for Scripted {
    async fn chat(&self, _system_prompt: &str, history: &[Turn]) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Anything else?".to_string()))
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}

fn engine(backend: Arc<Scripted>) -> InterviewEngine {
    let metadata = ProjectMetadata::new("Acme", "/tmp/acme", "Rust", "Inventory service");
    InterviewEngine::new(backend, metadata, InterviewOptions::default()).unwrap()
}

async fn drive(
    engine: &InterviewEngine,
    input: &str,
    auto_start: bool,
) -> (SessionOutcome, String) {
    let mut out = Vec::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        run_session(engine, input.as_bytes(), &mut out, auto_start),
    )
    .await
    .expect("session hung")
    .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn answers_then_done_produces_the_document() {
    let backend = Scripted::new([
        Ok("Who are your users?".to_string()),
        Ok("What problem do they have?".to_string()),
        Ok("Done.\n<product-description>\n# Acme\n\nDOC\n</product-description>".to_string()),
    ]);
    let engine = engine(Arc::clone(&backend));

    let (outcome, transcript) = drive(&engine, "Shop owners\n/done\n", true).await;

    assert_eq!(outcome, SessionOutcome::Completed("# Acme\n\nDOC".to_string()));
    assert!(transcript.contains("Who are your users?"));
    assert!(transcript.contains("What problem do they have?"));
    assert!(transcript.contains("(thinking...)"));

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1].last().unwrap().text(), "Shop owners");
    assert_eq!(
        seen[2].last().unwrap().text(),
        marginalia::GENERATE_NOW_PROMPT
    );
}

#[tokio::test]
async fn quit_abandons_the_interview() {
    let backend = Scripted::new([Ok("Who are your users?".to_string())]);
    let engine = engine(backend);

    let (outcome, _) = drive(&engine, "/quit\n", true).await;

    assert_eq!(outcome, SessionOutcome::Aborted);
}

#[tokio::test]
async fn end_of_input_is_reported() {
    let backend = Scripted::new([Ok("Who are your users?".to_string())]);
    let engine = engine(backend);

    let (outcome, _) = drive(&engine, "", true).await;

    assert_eq!(outcome, SessionOutcome::InputClosed);
}

#[tokio::test]
async fn backend_errors_are_shown_and_the_user_can_retry() {
    let backend = Scripted::new([
        Err(LlmError::Transport("connection refused".to_string())),
        Ok("Who are your users?".to_string()),
    ]);
    let engine = engine(Arc::clone(&backend));

    let (outcome, transcript) = drive(&engine, "hello again\n/quit\n", true).await;

    assert_eq!(outcome, SessionOutcome::Aborted);
    assert!(transcript.contains("error: LLM transport error: connection refused"));
    assert!(transcript.contains("Who are your users?"));
    assert_eq!(backend.seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn without_auto_start_the_first_line_opens() {
    let backend = Scripted::new([Ok("Tell me more.".to_string())]);
    let engine = engine(Arc::clone(&backend));

    let (outcome, transcript) = drive(&engine, "\nI build shelves\n", false).await;

    assert_eq!(outcome, SessionOutcome::InputClosed);
    assert!(transcript.contains("Tell me more."));

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 1);
    assert_eq!(seen[0][0].text(), "I build shelves");
}
