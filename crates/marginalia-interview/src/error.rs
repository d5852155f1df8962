use thiserror::Error;

/// Reasons a trigger was refused before anything was queued
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewError {
    #[error("interview engine must be created inside a tokio runtime")]
    NoRuntime,

    #[error("interview has already been started")]
    AlreadyStarted,

    #[error("interview is complete; no further turns are accepted")]
    AlreadyComplete,

    #[error("interview engine has been shut down")]
    Closed,
}
