//! Supervisor launch configuration.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SupervisorError;

/// Port of the fallback URL handed to the UI before the endpoint resolves.
pub const DEFAULT_FALLBACK_PORT: u16 = 5000;

/// Host the resolved endpoint and the fallback URL are built against.
pub const DEFAULT_HOST: &str = "localhost";

/// How long to watch the child's output for an announcement line.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the API server binary.
const SERVER_BIN: &str = if cfg!(windows) {
    "roost-server.exe"
} else {
    "roost-server"
};

/// Fixed configuration for launching the API server child process.
///
/// The executable is resolved by probing `primary` then `fallback`; the
/// launch fails fast with [`SupervisorError::ExecutableNotFound`] if
/// neither exists. No port argument is passed by default so the server
/// binds an OS-assigned ephemeral port, avoiding collisions between shell
/// instances.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Primary executable location, probed first.
    pub primary: PathBuf,
    /// Secondary executable location, probed if the primary is missing.
    pub fallback: PathBuf,
    /// Arguments passed to the child. Empty by default.
    pub args: Vec<String>,
    /// Working directory for the child. Defaults to the resolved
    /// executable's parent so relative lookups inside the server work.
    pub working_dir: Option<PathBuf>,
    /// Bound on the port discovery race.
    pub discovery_timeout: Duration,
    /// Port used for the pre-resolution fallback URL.
    pub fallback_port: u16,
}

impl SupervisorConfig {
    /// Create a config launching `executable`, with the fallback probe
    /// pointing at the same path.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let primary: PathBuf = executable.into();
        let fallback = primary.clone();
        Self {
            primary,
            fallback,
            args: Vec::new(),
            working_dir: None,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            fallback_port: DEFAULT_FALLBACK_PORT,
        }
    }

    /// Create a config with default paths: the release server build first,
    /// the debug build second, relative to the current directory.
    pub fn with_defaults() -> io::Result<Self> {
        let root = std::env::current_dir()?;
        let primary = root.join("target").join("release").join(SERVER_BIN);
        let fallback = root.join("target").join("debug").join(SERVER_BIN);
        Ok(Self::new(primary).fallback(fallback))
    }

    /// Set the secondary executable location.
    #[must_use]
    pub fn fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = path.into();
        self
    }

    /// Set the child's launch arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the child's working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the discovery timeout. Tests shorten this to keep runs fast.
    #[must_use]
    pub const fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the port of the pre-resolution fallback URL.
    #[must_use]
    pub const fn fallback_port(mut self, port: u16) -> Self {
        self.fallback_port = port;
        self
    }

    /// Resolve the executable to launch, probing primary then fallback.
    pub fn resolve_executable(&self) -> Result<PathBuf, SupervisorError> {
        if self.primary.exists() {
            return Ok(self.primary.clone());
        }
        if self.fallback.exists() {
            return Ok(self.fallback.clone());
        }
        Err(SupervisorError::ExecutableNotFound {
            primary: self.primary.clone(),
            fallback: self.fallback.clone(),
        })
    }

    /// The URL handed to the UI before the endpoint resolves.
    #[must_use]
    pub fn fallback_url(&self) -> String {
        format!("http://{DEFAULT_HOST}:{}", self.fallback_port)
    }
}
