//! Supervisor error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from launching, probing or stopping the backend.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// No backend executable (or dev script) exists at the resolved path.
    #[error("Backend executable not found at {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    /// Development mode could not find a Python interpreter.
    #[error("No Python interpreter found (tried: {})", tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    /// The OS refused to spawn the process.
    #[error("Failed to launch {}: {source}", program.display())]
    LaunchFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backend process is already alive.
    #[error("Backend is already running (pid {0})")]
    AlreadyRunning(u32),

    /// The backend did not answer the readiness probe in time.
    ///
    /// The process is left running.
    #[error("Backend at {url} did not become ready within {}s", timeout_secs)]
    ReadinessTimeout { url: String, timeout_secs: u64 },

    /// The backend exited while readiness was still being awaited.
    #[error("Backend exited before becoming ready ({status})")]
    ExitedBeforeReady { status: String },

    /// No backend process is alive.
    #[error("Backend is not running")]
    NotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SupervisorError {
    /// Whether this error happened before a process existed.
    ///
    /// These are reported to the user as "could not start the backend" and
    /// never abort the application run.
    pub const fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            Self::ExecutableNotFound { .. }
                | Self::InterpreterNotFound { .. }
                | Self::LaunchFailure { .. }
        )
    }
}
