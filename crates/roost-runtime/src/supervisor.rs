//! The process supervisor.
//!
//! Brings up exactly one API server child process, learns its listening
//! port from the announcement protocol, and tears the child down on
//! shutdown. Port discovery is a race between four event sources (a
//! stdout line, a stderr line, child exit, and a timer), with the first
//! announcement match winning.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use roost_core::announce::parse_announcement;
use roost_core::config::DEFAULT_HOST;
use roost_core::{ServerEndpoint, SupervisorConfig, SupervisorError, SupervisorState};
use serde::Serialize;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::shutdown::shutdown_child;
use crate::stream::{LossyLines, spawn_drain};

/// Overall bound on draining buffered output once the child-exit event
/// wins the discovery race. Closes the gap where an announcement is
/// emitted just before a fast exit.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Poll interval for detecting an unexpected exit after `Ready`.
const EXIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Diagnostic snapshot of the supervised process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProcessInfo {
    /// Resolved port, once `Ready`.
    pub port: Option<u16>,
    /// OS process id of the live child.
    pub pid: Option<u32>,
}

/// Owns the API server child process for the shell's lifetime.
///
/// One instance per shell. `start` suspends its caller until the endpoint
/// resolves or the attempt fails terminally; `stop` is idempotent and safe
/// to call from every shutdown path.
pub struct Supervisor {
    config: SupervisorConfig,
    state: RwLock<SupervisorState>,
    // Written on every successful resolution and never cleared by stop():
    // the URL the UI resolved stays constant for the shell's lifetime.
    endpoint: RwLock<Option<ServerEndpoint>>,
    // Shared with the exit watcher task; `stop` takes the child out of the
    // slot, so a handle can never be released twice.
    child: Arc<Mutex<Option<Child>>>,
}

impl Supervisor {
    /// Create a supervisor. No process is spawned until [`Self::start`].
    #[must_use]
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SupervisorState::NotStarted),
            endpoint: RwLock::new(None),
            child: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the API server and resolve its announced endpoint.
    ///
    /// Fails with [`SupervisorError::ExecutableNotFound`] before any spawn
    /// if neither configured path exists, [`SupervisorError::SpawnError`]
    /// on OS launch failure, [`SupervisorError::PrematureExit`] if the
    /// child dies before announcing, and
    /// [`SupervisorError::PortDiscoveryTimeout`] when the bound elapses.
    /// A failed or timed-out child is killed rather than orphaned.
    pub async fn start(&self) -> Result<ServerEndpoint, SupervisorError> {
        // At most one live child: a leftover from a previous attempt is
        // stopped before spawning again.
        if self.child.lock().await.is_some() {
            debug!("start called while a child is live; stopping it first");
            self.stop().await;
        }

        self.set_state(SupervisorState::Spawning).await;

        let executable = match self.config.resolve_executable() {
            Ok(path) => path,
            Err(err) => {
                self.fail(&err).await;
                return Err(err);
            }
        };
        let working_dir = self
            .config
            .working_dir
            .clone()
            .or_else(|| executable.parent().map(Path::to_path_buf));

        info!(executable = %executable.display(), "Starting API server");

        let mut command = Command::new(&executable);
        command
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = SupervisorError::SpawnError(e);
                self.fail(&err).await;
                return Err(err);
            }
        };

        // Both streams are always present with piped stdio
        let Some(stdout) = child.stdout.take() else {
            return Err(self.abandon(child, "child stdout not captured").await);
        };
        let Some(stderr) = child.stderr.take() else {
            return Err(self.abandon(child, "child stderr not captured").await);
        };
        let mut stdout = LossyLines::new(stdout);
        let mut stderr = LossyLines::new(stderr);

        self.set_state(SupervisorState::AwaitingAnnouncement).await;

        let discovered = discover_port(
            &mut child,
            &mut stdout,
            &mut stderr,
            self.config.discovery_timeout,
        )
        .await;

        match discovered {
            Ok((port, exited)) => {
                let endpoint = ServerEndpoint::new(DEFAULT_HOST, port);
                info!(port, url = %endpoint.url(), "API server ready");

                // The child must never block on a full pipe; keep draining
                spawn_drain(stdout, "stdout");
                spawn_drain(stderr, "stderr");

                *self.endpoint.write().await = Some(endpoint.clone());
                self.set_state(SupervisorState::Ready(endpoint.clone()))
                    .await;

                // A child that announced and exited straight away leaves
                // nothing to watch or stop later.
                let exited = match exited {
                    Some(status) => Some(status),
                    None => child.try_wait().ok().flatten(),
                };
                if let Some(status) = exited {
                    debug!(?status, "API server exited right after announcing");
                } else {
                    *self.child.lock().await = Some(child);
                    self.spawn_exit_watcher();
                }
                Ok(endpoint)
            }
            Err(err) => {
                warn!(error = %err, "Port discovery failed");
                // Kill rather than orphan; reaps an already-dead child
                if let Err(e) = shutdown_child(child).await {
                    debug!(error = %e, "cleanup of failed child reported an error");
                }
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    /// Terminate the child, if any. Idempotent: any number of consecutive
    /// calls, including before any `start`, are safe no-ops.
    pub async fn stop(&self) {
        let taken = self.child.lock().await.take();
        let Some(child) = taken else {
            debug!("stop called with no running child");
            return;
        };

        self.set_state(SupervisorState::Terminating).await;
        info!("Stopping API server");
        match shutdown_child(child).await {
            Ok(status) => debug!(?status, "API server stopped"),
            Err(e) => warn!(error = %e, "error while stopping API server"),
        }
        self.set_state(SupervisorState::Stopped).await;
    }

    /// The URL the UI should call.
    ///
    /// Before the first resolution this is the configured fallback
    /// (`http://localhost:5000` by default); a stale answer is preferred
    /// over a blocked UI. Once resolved it stays constant for the rest of
    /// the shell's lifetime: `stop()` never reverts it, only a later
    /// `start()` that resolves again overwrites it.
    pub async fn api_url(&self) -> String {
        match self.endpoint.read().await.as_ref() {
            Some(endpoint) => endpoint.url(),
            None => self.config.fallback_url(),
        }
    }

    /// Diagnostic port/pid snapshot.
    pub async fn server_info(&self) -> ServerProcessInfo {
        let port = self.endpoint.read().await.as_ref().map(|e| e.port);
        let pid = self.child.lock().await.as_ref().and_then(Child::id);
        ServerProcessInfo { port, pid }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SupervisorState {
        self.state.read().await.clone()
    }

    async fn set_state(&self, state: SupervisorState) {
        *self.state.write().await = state;
    }

    async fn fail(&self, err: &SupervisorError) {
        self.set_state(SupervisorState::Failed {
            reason: err.to_string(),
        })
        .await;
    }

    async fn abandon(&self, child: Child, reason: &str) -> SupervisorError {
        let err = SupervisorError::SpawnError(std::io::Error::other(reason.to_string()));
        if let Err(e) = shutdown_child(child).await {
            debug!(error = %e, "cleanup of abandoned child reported an error");
        }
        self.fail(&err).await;
        err
    }

    /// Watch for an unexpected exit after `Ready`.
    ///
    /// A post-`Ready` crash is logged and the handle released, nothing
    /// more: there is no auto-restart and the resolved URL is never
    /// re-resolved.
    fn spawn_exit_watcher(&self) {
        let child = Arc::clone(&self.child);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(EXIT_POLL_INTERVAL).await;
                let mut guard = child.lock().await;
                let Some(running) = guard.as_mut() else {
                    // stop() already took the handle
                    break;
                };
                match running.try_wait() {
                    Ok(Some(status)) => {
                        warn!(?status, "API server exited unexpectedly; not restarting");
                        *guard = None;
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(error = %e, "exit watcher failed to poll child");
                        break;
                    }
                }
            }
        });
    }
}

/// Race stdout lines, stderr lines, child exit, and the timer until the
/// first announcement match commits the port.
///
/// Also reports the exit status when the announcement was found after the
/// child had already exited, so the caller knows there is nothing left to
/// watch.
async fn discover_port(
    child: &mut Child,
    stdout: &mut LossyLines<ChildStdout>,
    stderr: &mut LossyLines<ChildStderr>,
    timeout: Duration,
) -> Result<(u16, Option<ExitStatus>), SupervisorError> {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut stdout_open = true;
    let mut stderr_open = true;

    loop {
        tokio::select! {
            line = stdout.next_line(), if stdout_open => match line {
                Ok(Some(text)) => {
                    debug!("server stdout: {}", text);
                    if let Some(port) = parse_announcement(&text) {
                        return Ok((port, None));
                    }
                }
                Ok(None) => stdout_open = false,
                Err(e) => {
                    debug!(error = %e, "stdout read failed during discovery");
                    stdout_open = false;
                }
            },
            line = stderr.next_line(), if stderr_open => match line {
                Ok(Some(text)) => {
                    debug!("server stderr: {}", text);
                    if let Some(port) = parse_announcement(&text) {
                        return Ok((port, None));
                    }
                }
                Ok(None) => stderr_open = false,
                Err(e) => {
                    debug!(error = %e, "stderr read failed during discovery");
                    stderr_open = false;
                }
            },
            status = child.wait() => {
                // The exit event can beat the last buffered lines; check
                // them before declaring failure.
                let status = status.map_err(SupervisorError::SpawnError)?;
                if let Some(port) = drain_buffered(stdout, stderr).await {
                    return Ok((port, Some(status)));
                }
                return Err(SupervisorError::PrematureExit(status.code()));
            },
            () = &mut deadline => {
                return Err(SupervisorError::PortDiscoveryTimeout(timeout));
            }
        }
    }
}

/// Check output still buffered in the pipes after the child exited.
///
/// Bounded as a whole: a grandchild inheriting the pipe could keep it
/// open, and keep emitting lines, past the child's own exit.
async fn drain_buffered(
    stdout: &mut LossyLines<ChildStdout>,
    stderr: &mut LossyLines<ChildStderr>,
) -> Option<u16> {
    let drain = async {
        while let Ok(Some(text)) = stdout.next_line().await {
            debug!("server stdout: {}", text);
            if let Some(port) = parse_announcement(&text) {
                return Some(port);
            }
        }
        while let Ok(Some(text)) = stderr.next_line().await {
            debug!("server stderr: {}", text);
            if let Some(port) = parse_announcement(&text) {
                return Some(port);
            }
        }
        None
    };
    tokio::time::timeout(EXIT_DRAIN_GRACE, drain)
        .await
        .unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_core::config::DEFAULT_FALLBACK_PORT;

    #[cfg(unix)]
    fn sh(script: &str) -> SupervisorConfig {
        SupervisorConfig::new("/bin/sh")
            .args(["-c", script])
            .discovery_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn api_url_falls_back_before_ready() {
        let supervisor = Supervisor::new(SupervisorConfig::new("unused"));
        assert_eq!(supervisor.api_url().await, "http://localhost:5000");
        assert_eq!(DEFAULT_FALLBACK_PORT, 5000);
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let supervisor = Supervisor::new(SupervisorConfig::new("unused"));
        supervisor.stop().await;
        supervisor.stop().await;
        assert_eq!(supervisor.state().await, SupervisorState::NotStarted);
    }

    #[tokio::test]
    async fn missing_executable_fails_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let config = SupervisorConfig::new(dir.path().join("release/server"))
            .fallback(dir.path().join("debug/server"));
        let supervisor = Supervisor::new(config);

        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::ExecutableNotFound { .. }));
        // Nothing was spawned
        assert!(supervisor.server_info().await.pid.is_none());
        assert!(matches!(
            supervisor.state().await,
            SupervisorState::Failed { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolves_port_from_sentinel() {
        let supervisor = Supervisor::new(sh("echo SERVER_PORT:43210; sleep 30"));

        let endpoint = supervisor.start().await.expect("start failed");
        assert_eq!(endpoint.port, 43210);
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(supervisor.api_url().await, "http://localhost:43210");
        assert!(supervisor.state().await.is_ready());
        assert!(supervisor.server_info().await.pid.is_some());

        supervisor.stop().await;
        assert_eq!(supervisor.state().await, SupervisorState::Stopped);
        // Idempotent after release
        supervisor.stop().await;
        supervisor.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolves_banner_from_stderr() {
        let supervisor = Supervisor::new(sh(
            "echo 'Now listening on: http://localhost:6001' 1>&2; sleep 30",
        ));

        let endpoint = supervisor.start().await.expect("start failed");
        assert_eq!(endpoint.port, 6001);
        supervisor.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn first_match_wins() {
        let supervisor =
            Supervisor::new(sh("echo SERVER_PORT:43210; echo SERVER_PORT:50505; sleep 30"));

        let endpoint = supervisor.start().await.expect("start failed");
        assert_eq!(endpoint.port, 43210);
        supervisor.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn announcement_beats_immediate_exit() {
        // No sleep: the exit event races the buffered announcement line
        let supervisor = Supervisor::new(sh("echo SERVER_PORT:43212"));

        let endpoint = supervisor.start().await.expect("start failed");
        assert_eq!(endpoint.port, 43212);

        // Whichever branch won the race, the exited child's handle ends
        // up released without disturbing the resolved endpoint
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(supervisor.server_info().await.pid.is_none());
        assert!(supervisor.state().await.is_ready());
        assert_eq!(supervisor.api_url().await, "http://localhost:43212");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn api_url_stays_resolved_after_stop() {
        let supervisor = Supervisor::new(sh("echo SERVER_PORT:43999; sleep 30"));

        supervisor.start().await.expect("start failed");
        assert_eq!(supervisor.api_url().await, "http://localhost:43999");

        supervisor.stop().await;
        assert_eq!(supervisor.state().await, SupervisorState::Stopped);
        // The UI keeps the URL it resolved; teardown never reverts it to
        // the fallback
        assert_eq!(supervisor.api_url().await, "http://localhost:43999");
        assert_eq!(supervisor.server_info().await.port, Some(43999));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn premature_exit_not_stalled_by_chatty_grandchild() {
        // The grandchild inherits the pipe and keeps writing after the
        // child exits; the post-exit drain is bounded as a whole, not per
        // line, so the verdict still lands promptly
        let supervisor =
            Supervisor::new(sh("(while true; do echo tick; sleep 0.05; done) & exit 7"));

        let started = tokio::time::Instant::now();
        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::PrematureExit(Some(7))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn times_out_without_announcement() {
        let timeout = Duration::from_millis(200);
        let supervisor =
            Supervisor::new(sh("echo 'no ports here'; sleep 30").discovery_timeout(timeout));

        let started = tokio::time::Instant::now();
        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::PortDiscoveryTimeout(t) if t == timeout));
        // Not earlier than the configured bound
        assert!(started.elapsed() >= timeout);
        // The child was killed, not orphaned
        assert!(supervisor.server_info().await.pid.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn premature_exit_carries_code() {
        let supervisor = Supervisor::new(sh("exit 1"));

        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::PrematureExit(Some(1))));
        assert!(matches!(
            supervisor.state().await,
            SupervisorState::Failed { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn restart_replaces_the_live_child() {
        let supervisor = Supervisor::new(sh("echo SERVER_PORT:43313; sleep 30"));

        let first = supervisor.start().await.expect("first start failed");
        let first_pid = supervisor.server_info().await.pid;

        // A second start stops the live child before spawning again, so at
        // most one handle is ever live, and the endpoint is overwritten
        let second = supervisor.start().await.expect("second start failed");
        let second_pid = supervisor.server_info().await.pid;

        assert_eq!(second.port, first.port);
        assert_ne!(first_pid, second_pid);
        assert!(second.resolved_at >= first.resolved_at);
        supervisor.stop().await;
    }
}
