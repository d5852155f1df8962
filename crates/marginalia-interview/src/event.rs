use std::fmt;

/// Progress notifications published by the interview engine.
///
/// One triggered call produces `Thinking` followed by exactly one of
/// `AssistantMessage` (optionally followed by `Complete`) or `Error`.
/// `respond` and `generate_now` emit `UserMessage` before `Thinking`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewEvent {
    /// A backend call is in flight
    Thinking,
    UserMessage(String),
    AssistantMessage(String),
    /// The extracted Markdown document; the interview is over
    Complete(String),
    Error(String),
}

impl InterviewEvent {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::UserMessage(_) => "user_message",
            Self::AssistantMessage(_) => "assistant_message",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    /// True for the events that close out one backend call.
    #[must_use]
    pub const fn ends_call(&self) -> bool {
        matches!(
            self,
            Self::AssistantMessage(_) | Self::Complete(_) | Self::Error(_)
        )
    }
}

impl fmt::Display for InterviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thinking => write!(f, "thinking"),
            Self::UserMessage(text) | Self::AssistantMessage(text) => {
                write!(f, "{}: {text}", self.kind())
            }
            Self::Complete(doc) => write!(f, "complete ({} bytes)", doc.len()),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
