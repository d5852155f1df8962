use std::time::Duration;
use thiserror::Error;

/// Failures while launching or supervising a child process
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Failed waiting for process: {reason}")]
    WaitFailed { reason: String },

    #[error("Process timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("Process monitor thread disconnected unexpectedly")]
    MonitorDisconnected,
}

impl RunnerError {
    /// True when the program could not be started at all.
    #[must_use]
    pub const fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::SpawnFailed { .. })
    }
}
