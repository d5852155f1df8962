//! Process-tree termination.
//!
//! Children are spawned as leaders of their own process group on Unix, so a
//! timed-out `claude` takes any helpers it forked down with it.

use tracing::debug;

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(err) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        // ESRCH just means everything already exited.
        debug!(pid, %err, "killpg failed");
    }
}

/// Tokio's `Child::kill` terminates the process itself; nothing else to do.
#[cfg(not(unix))]
pub(crate) fn kill_process_group(pid: u32) {
    debug!(pid, "process groups unavailable on this platform");
}
