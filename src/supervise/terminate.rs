// src/supervise/terminate.rs

use tokio::process::Child;
use tracing::debug;

use crate::errors::{LaunchError, Result};

/// Ask the child to shut down.
///
/// On Unix this is `SIGTERM`, so the miner can close its pool connection
/// cleanly. There is no escalation to `SIGKILL`; the caller waits for
/// whatever the child does.
#[cfg(unix)]
pub fn request_termination(child: &mut Child) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        debug!("child already reaped; nothing to terminate");
        return Ok(());
    };

    let raw = i32::try_from(pid).map_err(|_| LaunchError::Signal {
        pid,
        reason: "pid does not fit in pid_t".to_string(),
    })?;

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            debug!(pid, "child exited before SIGTERM was delivered");
            Ok(())
        }
        Err(e) => Err(LaunchError::Signal {
            pid,
            reason: e.to_string(),
        }),
    }
}

#[cfg(not(unix))]
pub fn request_termination(child: &mut Child) -> Result<()> {
    let pid = child.id().unwrap_or_default();
    child.start_kill().map_err(|e| LaunchError::Signal {
        pid,
        reason: e.to_string(),
    })
}
