use crate::command_spec::CommandSpec;
use crate::error::RunnerError;
use async_trait::async_trait;
use std::time::Duration;

/// Captured result of a child process that ran to completion.
///
/// stdout and stderr are captured separately. A process that exceeded its
/// timeout never produces a `ProcessOutput`; the runner reports
/// [`RunnerError::Timeout`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }

    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// stdout followed by stderr, for error reports.
    #[must_use]
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout_string();
        let stderr = self.stderr_string();
        match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
            (false, true) => stdout.trim_end().to_string(),
            (true, false) => stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Blocking process execution with a timeout.
pub trait ProcessRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError>;
}

/// Async process execution with a timeout.
///
/// Backends hold an `Arc<dyn AsyncProcessRunner>` so tests can substitute a
/// recording fake for real subprocesses.
#[async_trait]
pub trait AsyncProcessRunner: Send + Sync {
    async fn run(&self, cmd: &CommandSpec, timeout: Duration)
    -> Result<ProcessOutput, RunnerError>;
}
