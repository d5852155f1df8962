use std::io;
use std::process::ExitStatus;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};

#[derive(Debug)]
pub(crate) enum PipeReadError {
    Stdout(io::Error),
    Stderr(io::Error),
    Wait(io::Error),
}

impl std::fmt::Display for PipeReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout(e) => write!(f, "reading stdout: {e}"),
            Self::Stderr(e) => write!(f, "reading stderr: {e}"),
            Self::Wait(e) => write!(f, "waiting for exit: {e}"),
        }
    }
}

/// Drain both pipes concurrently until each reaches EOF, then reap the child.
///
/// Reading only one pipe at a time can deadlock once the other fills its
/// kernel buffer.
pub(crate) async fn read_pipes_until_exit(
    child: &mut Child,
    stdout_pipe: &mut ChildStdout,
    stderr_pipe: &mut ChildStderr,
    stdout: &mut Vec<u8>,
    stderr: &mut Vec<u8>,
) -> Result<ExitStatus, PipeReadError> {
    let mut stdout_buf = vec![0u8; 8192];
    let mut stderr_buf = vec![0u8; 8192];
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            result = stdout_pipe.read(&mut stdout_buf), if stdout_open => match result {
                Ok(0) => stdout_open = false,
                Ok(n) => stdout.extend_from_slice(&stdout_buf[..n]),
                Err(err) => return Err(PipeReadError::Stdout(err)),
            },
            result = stderr_pipe.read(&mut stderr_buf), if stderr_open => match result {
                Ok(0) => stderr_open = false,
                Ok(n) => stderr.extend_from_slice(&stderr_buf[..n]),
                Err(err) => return Err(PipeReadError::Stderr(err)),
            },
        }
    }

    child.wait().await.map_err(PipeReadError::Wait)
}
