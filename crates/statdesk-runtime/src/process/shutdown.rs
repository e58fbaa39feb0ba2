//! Graceful shutdown of the backend child with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::{Pid, getpgid};
#[cfg(unix)]
use tokio::time::timeout;

/// Time the backend gets to exit after SIGTERM.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Stop `child` and reap it.
///
/// On Unix: SIGTERM, wait up to [`GRACE_PERIOD`], then SIGKILL. A child
/// that leads its own process group is signalled as a group, and whatever
/// is left of the group after it exits is killed. On other platforms the
/// process is killed immediately. A child that already exited is simply
/// reaped.
pub async fn shutdown_child(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    #[cfg(unix)]
    {
        shutdown_unix(child).await
    }

    #[cfg(not(unix))]
    {
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped
        return child.wait().await;
    };
    let pid = Pid::from_raw(i32::try_from(pid).map_err(io::Error::other)?);
    let group = leads_group(pid);

    if let Err(e) = send(pid, group, Signal::SIGTERM) {
        if e == Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    let status = if let Ok(result) = timeout(GRACE_PERIOD, child.wait()).await {
        result?
    } else {
        tracing::warn!(pid = pid.as_raw(), "Backend ignored SIGTERM; sending SIGKILL");
        child.kill().await?;
        child.wait().await?
    };

    if group {
        match signal::killpg(pid, Signal::SIGKILL) {
            Ok(()) => tracing::debug!(pgid = pid.as_raw(), "Killed backend descendants"),
            Err(Errno::ESRCH) => {}
            Err(e) => {
                tracing::warn!(pgid = pid.as_raw(), error = %e, "Failed to kill backend descendants");
            }
        }
    }
    Ok(status)
}

#[cfg(unix)]
fn leads_group(pid: Pid) -> bool {
    getpgid(Some(pid)).is_ok_and(|pgid| pgid == pid)
}

#[cfg(unix)]
fn send(pid: Pid, group: bool, sig: Signal) -> nix::Result<()> {
    if group {
        signal::killpg(pid, sig)
    } else {
        signal::kill(pid, sig)
    }
}
