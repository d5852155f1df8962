//! Line-oriented terminal front end for an [`InterviewEngine`].
//!
//! Reads answers from `input` one line at a time and renders events to
//! `output`. Two commands are recognised on a line of their own: `/done`
//! asks for the document immediately and `/quit` abandons the interview.

use anyhow::{Context, Result};
use marginalia_interview::{InterviewEngine, InterviewEvent, InterviewState};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub const DONE_COMMAND: &str = "/done";
pub const QUIT_COMMAND: &str = "/quit";

/// How a terminal session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The extracted product description
    Completed(String),
    /// `/quit` was entered
    Aborted,
    /// Input reached end-of-file first
    InputClosed,
}

/// Drive `engine` from `input` until the interview completes or the user
/// leaves. With `auto_start` the assistant speaks first; otherwise the first
/// line typed opens the conversation.
pub async fn run_session<R, W>(
    engine: &InterviewEngine,
    input: R,
    output: &mut W,
    auto_start: bool,
) -> Result<SessionOutcome>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut events = engine.subscribe();
    let mut lines = input.lines();

    writeln!(
        output,
        "Interviewing for '{}'. Type {DONE_COMMAND} to get the description now, {QUIT_COMMAND} to leave.",
        engine.metadata().name()
    )?;

    let mut awaiting = false;
    if auto_start {
        engine.start()?;
        awaiting = true;
    }

    loop {
        if awaiting {
            if let Some(document) = wait_for_reply(engine, &mut events, output).await? {
                return Ok(SessionOutcome::Completed(document));
            }
        }

        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            debug!("input closed");
            return Ok(SessionOutcome::InputClosed);
        };

        match line.trim() {
            "" => {
                awaiting = false;
                continue;
            }
            QUIT_COMMAND => return Ok(SessionOutcome::Aborted),
            DONE_COMMAND => engine.generate_now()?,
            answer => engine.respond(answer)?,
        }
        awaiting = true;
    }
}

/// Render events until the current backend call is over. Returns the
/// document when the call completed the interview.
async fn wait_for_reply<W: Write>(
    engine: &InterviewEngine,
    events: &mut tokio::sync::broadcast::Receiver<InterviewEvent>,
    output: &mut W,
) -> Result<Option<String>> {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "terminal fell behind the event stream");
                continue;
            }
            Err(RecvError::Closed) => anyhow::bail!("interview engine stopped unexpectedly"),
        };

        match event {
            InterviewEvent::Thinking => {
                writeln!(output, "(thinking...)")?;
            }
            InterviewEvent::UserMessage(_) => {}
            InterviewEvent::AssistantMessage(text) => {
                writeln!(output, "\n{text}\n")?;
                // State is updated before the event is published.
                if engine.state() != InterviewState::Terminated {
                    return Ok(None);
                }
            }
            InterviewEvent::Complete(document) => return Ok(Some(document)),
            InterviewEvent::Error(message) => {
                writeln!(output, "error: {message}")?;
                writeln!(output, "Try again, or type {QUIT_COMMAND} to leave.")?;
                return Ok(None);
            }
        }
    }
}
