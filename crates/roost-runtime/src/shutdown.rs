//! Graceful child shutdown with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL.
#[cfg(unix)]
const TERM_GRACE: Duration = Duration::from_secs(5);

/// Terminate a child process and wait for it to be reaped.
///
/// On Unix the child first gets SIGTERM and up to [`TERM_GRACE`] to exit on
/// its own before SIGKILL. Windows has no graceful signal, so the child is
/// killed outright. A child that already exited is simply reaped.
pub async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    // Already exited: just collect the status
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => {
                    if let Ok(status) = tokio::time::timeout(TERM_GRACE, child.wait()).await {
                        return status;
                    }
                    // Grace period elapsed, escalate
                }
                // ESRCH: the process is already gone, fall through to reap
                Err(nix::errno::Errno::ESRCH) => return child.wait().await,
                Err(e) => return Err(io::Error::other(e)),
            }
        }
    }

    // start_kill fails only if the child exited since the check above;
    // wait() then returns the stored status either way.
    let _ = child.start_kill();
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn terminates_sigterm_responsive_child() {
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let status = shutdown_child(child).await.expect("shutdown failed");
        // Killed by signal, so no exit code on unix
        assert!(status.code().is_none());
    }

    #[tokio::test]
    async fn reaps_already_exited_child() {
        let child = Command::new("echo")
            .arg("done")
            .stdout(std::process::Stdio::null())
            .spawn()
            .expect("failed to spawn echo");

        sleep(Duration::from_millis(100)).await;

        let status = shutdown_child(child).await.expect("shutdown failed");
        assert!(status.success());
    }
}
