use crate::command_spec::CommandSpec;
use crate::error::RunnerError;
use crate::io::read_pipes_until_exit;
use crate::platform::kill_process_group;
use crate::process::{AsyncProcessRunner, ProcessOutput};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Async runner backed by `tokio::process`.
///
/// * stdin is closed, stdout and stderr are captured separately
/// * the child leads its own process group (Unix) and is killed on drop
/// * when `timeout` elapses the whole group is killed and the child reaped
///   before [`RunnerError::Timeout`] is returned
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl TokioRunner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AsyncProcessRunner for TokioRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let mut command = cmd.to_tokio_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: cmd.program_display(),
            reason: e.to_string(),
        })?;
        let pid = child.id();
        let started = Instant::now();
        debug!(program = %cmd.program_display(), pid = ?pid, "spawned process");

        let missing_pipe = || RunnerError::WaitFailed {
            reason: "child pipes were not captured".to_string(),
        };
        let mut stdout_pipe = child.stdout.take().ok_or_else(missing_pipe)?;
        let mut stderr_pipe = child.stderr.take().ok_or_else(missing_pipe)?;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let outcome = tokio::time::timeout(
            timeout,
            read_pipes_until_exit(
                &mut child,
                &mut stdout_pipe,
                &mut stderr_pipe,
                &mut stdout,
                &mut stderr,
            ),
        )
        .await;

        match outcome {
            Ok(Ok(status)) => {
                debug!(
                    pid = ?pid,
                    exit_code = ?status.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "process exited"
                );
                Ok(ProcessOutput::new(stdout, stderr, status.code()))
            }
            Ok(Err(err)) => Err(RunnerError::WaitFailed {
                reason: err.to_string(),
            }),
            Err(_) => {
                warn!(
                    program = %cmd.program_display(),
                    timeout_secs = timeout.as_secs(),
                    "process exceeded timeout; killing process group"
                );
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                // kill() also waits, so the child is reaped before we return.
                if let Err(err) = child.kill().await {
                    debug!(%err, "kill after timeout failed");
                }
                Err(RunnerError::Timeout { timeout })
            }
        }
    }
}
