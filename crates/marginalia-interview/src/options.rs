use marginalia_config::{Config, DEFAULT_MAX_QUESTIONS, DEFAULT_MIN_QUESTIONS};
use marginalia_utils::error::ConfigError;
use std::str::FromStr;

/// Broadcast buffer per subscriber; slow subscribers lose the oldest events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// What happens to triggers that arrive after `Complete`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Refuse them; queued ones surface as an `Error` event
    #[default]
    Reject,
    /// Return to idle and keep talking to the backend
    Reopen,
}

impl FromStr for CompletionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "reopen" => Ok(Self::Reopen),
            _ => Err(ConfigError::InvalidValue {
                key: "interview.after_complete".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewOptions {
    pub min_questions: u32,
    pub max_questions: u32,
    pub completion_policy: CompletionPolicy,
    /// Hidden first user turn added by `start()`
    pub kickoff_message: Option<String>,
    pub event_capacity: usize,
}

impl Default for InterviewOptions {
    fn default() -> Self {
        Self {
            min_questions: DEFAULT_MIN_QUESTIONS,
            max_questions: DEFAULT_MAX_QUESTIONS,
            completion_policy: CompletionPolicy::Reject,
            kickoff_message: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl InterviewOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            min_questions: config.min_questions(),
            max_questions: config.max_questions(),
            completion_policy: config.after_complete().parse()?,
            kickoff_message: config.kickoff_message().map(str::to_string),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        })
    }

    #[must_use]
    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        self
    }

    #[must_use]
    pub fn with_kickoff_message(mut self, message: impl Into<String>) -> Self {
        self.kickoff_message = Some(message.into());
        self
    }
}
