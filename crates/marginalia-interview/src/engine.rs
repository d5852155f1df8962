//! The interview engine.
//!
//! Triggers (`start`, `respond`, `generate_now`) return immediately after
//! queueing a command. A single worker task drains the queue in FIFO order,
//! so at most one backend call is in flight per engine and the events of one
//! call are all published before the next call begins.
//!
//! ```text
//!            trigger                 reply without document
//!   Idle ───────────▶ AwaitingBackend ────────────────────▶ Idle
//!                          │  ▲   error
//!                          │  └──────────────────────────── (Idle)
//!                          │ reply with document
//!                          ▼
//!                     Terminated ──(Reopen policy)──▶ Idle
//! ```

use crate::error::InterviewError;
use crate::event::InterviewEvent;
use crate::extraction::extract_product_description;
use crate::metadata::ProjectMetadata;
use crate::options::{CompletionPolicy, InterviewOptions};
use crate::prompt::{GENERATE_NOW_PROMPT, build_system_prompt};
use marginalia_llm::{ChatBackend, Turn};
use marginalia_utils::logging::interview_span;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewState {
    Idle,
    AwaitingBackend,
    Terminated,
}

#[derive(Debug)]
enum Trigger {
    Start,
    Respond(String),
    GenerateNow,
}

#[derive(Debug)]
struct Conversation {
    state: InterviewState,
    history: Vec<Turn>,
}

type SharedConversation = Arc<Mutex<Conversation>>;

fn lock(conversation: &Mutex<Conversation>) -> MutexGuard<'_, Conversation> {
    conversation.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one interview against one backend.
pub struct InterviewEngine {
    metadata: ProjectMetadata,
    system_prompt: Arc<str>,
    provider: &'static str,
    policy: CompletionPolicy,
    conversation: SharedConversation,
    events: broadcast::Sender<InterviewEvent>,
    triggers: mpsc::UnboundedSender<Trigger>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for InterviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewEngine")
            .field("project", &self.metadata.name())
            .field("provider", &self.provider)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl InterviewEngine {
    /// Create an engine whose worker runs on the current tokio runtime.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        metadata: ProjectMetadata,
        options: InterviewOptions,
    ) -> Result<Self, InterviewError> {
        let handle = Handle::try_current().map_err(|_| InterviewError::NoRuntime)?;
        Ok(Self::with_handle(&handle, backend, metadata, options))
    }

    /// Create an engine whose worker runs on `handle`.
    pub fn with_handle(
        handle: &Handle,
        backend: Arc<dyn ChatBackend>,
        metadata: ProjectMetadata,
        options: InterviewOptions,
    ) -> Self {
        let system_prompt: Arc<str> =
            build_system_prompt(&metadata, options.min_questions, options.max_questions).into();
        let provider = backend.provider();
        let conversation = Arc::new(Mutex::new(Conversation {
            state: InterviewState::Idle,
            history: Vec::new(),
        }));
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        let (triggers, queue) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = Worker {
            backend,
            system_prompt: Arc::clone(&system_prompt),
            policy: options.completion_policy,
            kickoff: options.kickoff_message,
            conversation: Arc::clone(&conversation),
            events: events.clone(),
        };
        let span = interview_span(metadata.name(), provider);
        handle.spawn(worker.run(queue, cancel.clone()).instrument(span));

        Self {
            metadata,
            system_prompt,
            provider,
            policy: options.completion_policy,
            conversation,
            events,
            triggers,
            started: AtomicBool::new(false),
            cancel,
        }
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InterviewEvent> {
        self.events.subscribe()
    }

    /// Ask the backend for its opening question. Allowed once.
    pub fn start(&self) -> Result<(), InterviewError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(InterviewError::AlreadyStarted);
        }
        self.enqueue(Trigger::Start)
    }

    /// Send the user's answer.
    pub fn respond(&self, text: impl Into<String>) -> Result<(), InterviewError> {
        self.ensure_open()?;
        self.enqueue(Trigger::Respond(text.into()))
    }

    /// Ask the backend to write the document from what it has so far.
    pub fn generate_now(&self) -> Result<(), InterviewError> {
        self.ensure_open()?;
        self.enqueue(Trigger::GenerateNow)
    }

    #[must_use]
    pub fn state(&self) -> InterviewState {
        lock(&self.conversation).state
    }

    /// Snapshot of the transcript so far.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        lock(&self.conversation).history.clone()
    }

    #[must_use]
    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Stop the worker. A backend call in flight is dropped, which kills a
    /// CLI child process.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            debug!(project = %self.metadata.name(), "shutting down interview engine");
            self.cancel.cancel();
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.triggers.is_closed()
    }

    fn ensure_open(&self) -> Result<(), InterviewError> {
        if self.policy == CompletionPolicy::Reject && self.state() == InterviewState::Terminated {
            return Err(InterviewError::AlreadyComplete);
        }
        Ok(())
    }

    fn enqueue(&self, trigger: Trigger) -> Result<(), InterviewError> {
        if self.cancel.is_cancelled() {
            return Err(InterviewError::Closed);
        }
        trace!(?trigger, "queueing trigger");
        self.triggers
            .send(trigger)
            .map_err(|_| InterviewError::Closed)
    }
}

impl Drop for InterviewEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns the backend and processes triggers one at a time.
struct Worker {
    backend: Arc<dyn ChatBackend>,
    system_prompt: Arc<str>,
    policy: CompletionPolicy,
    kickoff: Option<String>,
    conversation: SharedConversation,
    events: broadcast::Sender<InterviewEvent>,
}

impl Worker {
    async fn run(self, mut queue: mpsc::UnboundedReceiver<Trigger>, cancel: CancellationToken) {
        loop {
            let trigger = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = queue.recv() => match next {
                    Some(trigger) => trigger,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("engine shut down during a backend call");
                    break;
                }
                () = self.handle(trigger) => {}
            }
        }
        debug!("interview worker stopped");
    }

    async fn handle(&self, trigger: Trigger) {
        if !self.admit() {
            return;
        }

        let echoed = {
            let mut conversation = lock(&self.conversation);
            match trigger {
                Trigger::Start => {
                    if let Some(kickoff) = &self.kickoff {
                        conversation.history.push(Turn::user(kickoff.clone()));
                    }
                    None
                }
                Trigger::Respond(text) => {
                    conversation.history.push(Turn::user(text.clone()));
                    Some(text)
                }
                Trigger::GenerateNow => {
                    conversation.history.push(Turn::user(GENERATE_NOW_PROMPT));
                    Some(GENERATE_NOW_PROMPT.to_string())
                }
            }
        };
        if let Some(text) = echoed {
            self.emit(InterviewEvent::UserMessage(text));
        }

        self.exchange().await;
    }

    /// Apply the completion policy to a trigger dequeued after `Complete`.
    fn admit(&self) -> bool {
        let mut conversation = lock(&self.conversation);
        if conversation.state != InterviewState::Terminated {
            return true;
        }
        match self.policy {
            CompletionPolicy::Reject => {
                drop(conversation);
                self.emit(InterviewEvent::Error(
                    InterviewError::AlreadyComplete.to_string(),
                ));
                false
            }
            CompletionPolicy::Reopen => {
                info!("reopening completed interview");
                conversation.state = InterviewState::Idle;
                true
            }
        }
    }

    async fn exchange(&self) {
        let history = {
            let mut conversation = lock(&self.conversation);
            conversation.state = InterviewState::AwaitingBackend;
            conversation.history.clone()
        };
        self.emit(InterviewEvent::Thinking);
        debug!(
            provider = self.backend.provider(),
            turns = history.len(),
            "calling backend"
        );

        match self.backend.chat(&self.system_prompt, &history).await {
            Ok(reply) => {
                let document = extract_product_description(&reply);
                {
                    let mut conversation = lock(&self.conversation);
                    conversation.history.push(Turn::assistant(reply.clone()));
                    conversation.state = if document.is_some() {
                        InterviewState::Terminated
                    } else {
                        InterviewState::Idle
                    };
                }
                self.emit(InterviewEvent::AssistantMessage(reply));
                if let Some(document) = document {
                    info!(bytes = document.len(), "product description complete");
                    self.emit(InterviewEvent::Complete(document));
                }
            }
            Err(err) => {
                warn!(error = %err, "backend call failed");
                lock(&self.conversation).state = InterviewState::Idle;
                self.emit(InterviewEvent::Error(err.to_string()));
            }
        }
    }

    fn emit(&self, event: InterviewEvent) {
        trace!(kind = event.kind(), "emitting event");
        // No subscribers is fine; events are transient.
        let _ = self.events.send(event);
    }
}
