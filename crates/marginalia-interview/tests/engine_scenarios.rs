//! End-to-end engine behaviour against a scripted backend.

use async_trait::async_trait;
use marginalia_interview::{
    CompletionPolicy, GENERATE_NOW_PROMPT, InterviewEngine, InterviewError, InterviewEvent,
    InterviewOptions, InterviewState, ProjectMetadata,
};
use marginalia_llm::{ChatBackend, LlmError, Role, Turn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Replies from a queue and records every call it receives.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(String, Vec<Turn>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl ScriptedBackend {
    fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    fn slow(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: Duration::from_millis(30),
            ..Self::default()
        })
    }

    fn histories(&self) -> Vec<Vec<Turn>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, history)| history.clone())
            .collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, system_prompt: &str, history: &[Turn]) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), history.to_vec()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Anything else?".to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}

fn metadata() -> ProjectMetadata {
    ProjectMetadata::new(
        "TestProject",
        "/tmp/test-project",
        "Rust",
        "A project used in tests",
    )
}

fn engine(backend: Arc<ScriptedBackend>, options: InterviewOptions) -> InterviewEngine {
    InterviewEngine::new(backend, metadata(), options).unwrap()
}

async fn next(rx: &mut broadcast::Receiver<InterviewEvent>) -> InterviewEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

async fn take(rx: &mut broadcast::Receiver<InterviewEvent>, n: usize) -> Vec<InterviewEvent> {
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        events.push(next(rx).await);
    }
    events
}

fn assistant(text: &str) -> InterviewEvent {
    InterviewEvent::AssistantMessage(text.to_string())
}

fn user(text: &str) -> InterviewEvent {
    InterviewEvent::UserMessage(text.to_string())
}

#[tokio::test]
async fn start_asks_the_first_question() {
    let backend = ScriptedBackend::new([Ok("What are you building?".to_string())]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    engine.start().unwrap();

    assert_eq!(
        take(&mut rx, 2).await,
        vec![InterviewEvent::Thinking, assistant("What are you building?")]
    );
    assert_eq!(engine.state(), InterviewState::Idle);

    let calls = backend.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains("TestProject"));
    assert!(calls[0].1.is_empty(), "no kickoff configured");
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history()[0].role(), Role::Assistant);
}

#[tokio::test]
async fn each_call_sees_the_whole_transcript() {
    let backend = ScriptedBackend::new([
        Ok("Q1".to_string()),
        Ok("Q2".to_string()),
        Ok("Q3".to_string()),
    ]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    engine.start().unwrap();
    take(&mut rx, 2).await;

    engine.respond("A1").unwrap();
    assert_eq!(
        take(&mut rx, 3).await,
        vec![user("A1"), InterviewEvent::Thinking, assistant("Q2")]
    );

    engine.respond("A2").unwrap();
    take(&mut rx, 3).await;

    let lengths: Vec<usize> = backend.histories().iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![0, 2, 4]);

    let last = &backend.histories()[2];
    let texts: Vec<&str> = last.iter().map(Turn::text).collect();
    assert_eq!(texts, vec!["Q1", "A1", "Q2", "A2"]);
}

#[tokio::test]
async fn generate_now_completes_and_closes_the_interview() {
    let reply = "Here it is.\n<product-description>\n# TestProject\n\nDOC\n</product-description>";
    let backend = ScriptedBackend::new([Ok("Q1".to_string()), Ok(reply.to_string())]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    engine.start().unwrap();
    take(&mut rx, 2).await;

    engine.generate_now().unwrap();
    assert_eq!(
        take(&mut rx, 4).await,
        vec![
            user(GENERATE_NOW_PROMPT),
            InterviewEvent::Thinking,
            assistant(reply),
            InterviewEvent::Complete("# TestProject\n\nDOC".to_string()),
        ]
    );

    assert_eq!(engine.state(), InterviewState::Terminated);
    assert_eq!(engine.respond("more"), Err(InterviewError::AlreadyComplete));
    assert_eq!(engine.generate_now(), Err(InterviewError::AlreadyComplete));
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn backend_failure_becomes_an_error_event() {
    let backend = ScriptedBackend::new([
        Err(LlmError::Transport("API connection failed".to_string())),
        Ok("Recovered".to_string()),
    ]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    engine.start().unwrap();
    let events = take(&mut rx, 2).await;
    assert_eq!(events[0], InterviewEvent::Thinking);
    match &events[1] {
        InterviewEvent::Error(msg) => assert!(msg.contains("API connection failed"), "{msg}"),
        other => panic!("expected Error, got {other:?}"),
    }
    assert_eq!(engine.state(), InterviewState::Idle);
    assert!(engine.history().is_empty());

    engine.respond("still there?").unwrap();
    assert_eq!(
        take(&mut rx, 3).await,
        vec![user("still there?"), InterviewEvent::Thinking, assistant("Recovered")]
    );
}

#[tokio::test]
async fn start_only_once() {
    let backend = ScriptedBackend::new([Ok("Q1".to_string())]);
    let engine = engine(backend, InterviewOptions::default());

    engine.start().unwrap();
    assert_eq!(engine.start(), Err(InterviewError::AlreadyStarted));
}

#[tokio::test]
async fn kickoff_is_sent_but_not_echoed() {
    let backend = ScriptedBackend::new([Ok("Q1".to_string())]);
    let options = InterviewOptions::default().with_kickoff_message("Let's begin.");
    let engine = engine(Arc::clone(&backend), options);
    let mut rx = engine.subscribe();

    engine.start().unwrap();
    assert_eq!(
        take(&mut rx, 2).await,
        vec![InterviewEvent::Thinking, assistant("Q1")]
    );

    let first = &backend.histories()[0];
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].role(), Role::User);
    assert_eq!(first[0].text(), "Let's begin.");
}

#[tokio::test]
async fn queued_trigger_after_completion_is_rejected_as_an_event() {
    let doc = "<product-description>DOC</product-description>";
    let backend = ScriptedBackend::slow([Ok(doc.to_string())]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    // Both are queued before the first call finishes.
    engine.generate_now().unwrap();
    engine.respond("too late").unwrap();

    let events = take(&mut rx, 5).await;
    assert_eq!(events[3], InterviewEvent::Complete("DOC".to_string()));
    assert_eq!(
        events[4],
        InterviewEvent::Error(InterviewError::AlreadyComplete.to_string())
    );
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn reopen_policy_keeps_the_conversation_going() {
    let backend = ScriptedBackend::new([
        Ok("<product-description>v1</product-description>".to_string()),
        Ok("<product-description>v2</product-description>".to_string()),
    ]);
    let options = InterviewOptions::default().with_completion_policy(CompletionPolicy::Reopen);
    let engine = engine(Arc::clone(&backend), options);
    let mut rx = engine.subscribe();

    engine.generate_now().unwrap();
    let first = take(&mut rx, 4).await;
    assert_eq!(first[3], InterviewEvent::Complete("v1".to_string()));
    assert_eq!(engine.state(), InterviewState::Terminated);

    engine.respond("Add a section on pricing").unwrap();
    let second = take(&mut rx, 4).await;
    assert_eq!(second[0], user("Add a section on pricing"));
    assert_eq!(second[3], InterviewEvent::Complete("v2".to_string()));

    assert_eq!(backend.histories()[1].len(), 3);
}

#[tokio::test]
async fn calls_are_serialized_and_events_stay_grouped() {
    let backend = ScriptedBackend::slow([
        Ok("Q1".to_string()),
        Ok("Q2".to_string()),
        Ok("Q3".to_string()),
    ]);
    let engine = engine(Arc::clone(&backend), InterviewOptions::default());
    let mut rx = engine.subscribe();

    engine.respond("one").unwrap();
    engine.respond("two").unwrap();
    engine.respond("three").unwrap();

    assert_eq!(
        take(&mut rx, 9).await,
        vec![
            user("one"),
            InterviewEvent::Thinking,
            assistant("Q1"),
            user("two"),
            InterviewEvent::Thinking,
            assistant("Q2"),
            user("three"),
            InterviewEvent::Thinking,
            assistant("Q3"),
        ]
    );
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_subscriber_sees_every_event() {
    let backend = ScriptedBackend::new([Ok("Q1".to_string())]);
    let engine = engine(backend, InterviewOptions::default());
    let mut a = engine.subscribe();
    let mut b = engine.subscribe();

    engine.start().unwrap();

    assert_eq!(take(&mut a, 2).await, take(&mut b, 2).await);
}

#[tokio::test]
async fn shutdown_refuses_further_triggers() {
    let backend = ScriptedBackend::new([]);
    let engine = engine(backend, InterviewOptions::default());

    engine.shutdown();

    assert!(engine.is_closed());
    assert_eq!(engine.respond("hello"), Err(InterviewError::Closed));
    assert_eq!(engine.start(), Err(InterviewError::Closed));
}

#[test]
fn engine_runs_on_an_explicit_runtime_handle() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let backend = ScriptedBackend::new([Ok("Q1".to_string())]);
    let engine = InterviewEngine::with_handle(
        runtime.handle(),
        backend,
        metadata(),
        InterviewOptions::default(),
    );
    let mut rx = engine.subscribe();

    engine.start().unwrap();

    let events = runtime.block_on(take(&mut rx, 2));
    assert_eq!(events, vec![InterviewEvent::Thinking, assistant("Q1")]);
}
