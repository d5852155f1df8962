use async_trait::async_trait;
use marginalia_utils::error::LlmError;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One immutable message of the interview transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Text of the most recent user turn, if any.
#[must_use]
pub fn latest_user_message(history: &[Turn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|turn| turn.role == Role::User)
        .map(Turn::text)
}

/// A chat model that answers the conversation so far.
///
/// Callers always pass the full ordered history. Stateless backends send all
/// of it; session-based backends may send only the newest user turn and rely
/// on state kept on the other side.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Produce the assistant's next message.
    async fn chat(&self, system_prompt: &str, history: &[Turn]) -> Result<String, LlmError>;

    /// Short provider name for logs ("anthropic", "claude-cli").
    fn provider(&self) -> &'static str;
}
