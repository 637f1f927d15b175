//! Supervisor error taxonomy.
//!
//! Every variant is terminal for the current launch attempt; none are
//! retried automatically. Startup failures propagate to the shell's
//! top-level handler, which logs and exits.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the process supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Neither the primary nor the fallback executable path exists.
    /// Raised before any spawn attempt.
    #[error(
        "server executable not found at {} or {}. Build the server first.",
        .primary.display(),
        .fallback.display()
    )]
    ExecutableNotFound {
        /// Primary search path.
        primary: PathBuf,
        /// Secondary search path.
        fallback: PathBuf,
    },

    /// OS-level failure starting the child process.
    #[error("failed to spawn server process: {0}")]
    SpawnError(#[from] std::io::Error),

    /// The child exited before any announcement line matched.
    /// The exit code is `None` when the child was killed by a signal.
    #[error("server exited before announcing a port (exit code {0:?})")]
    PrematureExit(Option<i32>),

    /// No announcement line matched within the configured bound.
    #[error("no port announcement within {0:?}")]
    PortDiscoveryTimeout(Duration),
}
