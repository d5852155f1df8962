//! Blocking runner for short helper processes such as `which claude`.

use crate::command_spec::CommandSpec;
use crate::error::RunnerError;
use crate::process::{ProcessOutput, ProcessRunner};
use std::process::Stdio;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Runs a command on a helper thread and kills it if `timeout` elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn terminate_process(pid: u32) {
        #[cfg(unix)]
        {
            // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
            unsafe {
                libc::kill(pid as i32, libc::SIGKILL);
            }
        }

        #[cfg(windows)]
        {
            use windows::Win32::Foundation::CloseHandle;
            use windows::Win32::System::Threading::{
                OpenProcess, PROCESS_TERMINATE, TerminateProcess,
            };

            // SAFETY: the handle is closed before leaving the block.
            unsafe {
                if let Ok(handle) = OpenProcess(PROCESS_TERMINATE, false, pid) {
                    let _ = TerminateProcess(handle, 1);
                    let _ = CloseHandle(handle);
                }
            }
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = pid;
        }
    }
}

impl ProcessRunner for NativeRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError> {
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: cmd.program_display(),
            reason: e.to_string(),
        })?;
        let pid = child.id();
        debug!(program = %cmd.program_display(), pid, "spawned helper process");

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let _ = tx.send(child.wait_with_output());
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = handle.join();
                let output = result.map_err(|e| RunnerError::WaitFailed {
                    reason: e.to_string(),
                })?;
                Ok(ProcessOutput::new(
                    output.stdout,
                    output.stderr,
                    output.status.code(),
                ))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Self::terminate_process(pid);
                let _ = handle.join();
                Err(RunnerError::Timeout { timeout })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RunnerError::MonitorDisconnected),
        }
    }
}
