//! CLI-specific error types and exit codes.

use statdesk_core::{ConfigError, PathError};
use statdesk_runtime::SupervisorError;
use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Error surfaced by a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or unresolvable launch configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend process failure in the standalone runner.
    #[error("Backend error: {0}")]
    Backend(#[from] SupervisorError),

    /// The backend ended on its own with a failure status.
    #[error("Backend exited unexpectedly ({0})")]
    BackendExited(String),

    /// Full application run failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// IO error (writing output, installing signal handlers).
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code, following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Backend(
                SupervisorError::ExecutableNotFound { .. }
                | SupervisorError::InterpreterNotFound { .. },
            ) => 69, // EX_UNAVAILABLE
            Self::Backend(SupervisorError::ReadinessTimeout { .. }) => 75, // EX_TEMPFAIL
            Self::Backend(_) => 71, // EX_OSERR
            Self::Io(_) => 74,      // EX_IOERR
            Self::BackendExited(_) | Self::Lifecycle(_) => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_timeout_is_temporary_failure() {
        let err = CliError::from(SupervisorError::ReadinessTimeout {
            url: "http://127.0.0.1:8000/".into(),
            timeout_secs: 30,
        });
        assert_eq!(err.exit_code(), 75);
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn missing_backend_is_unavailable() {
        let err = CliError::from(SupervisorError::InterpreterNotFound {
            tried: vec!["python".into(), "python3".into()],
        });
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn config_errors_map_to_ex_config() {
        let err = CliError::from(ConfigError::InvalidPort(80));
        assert_eq!(err.exit_code(), 78);
        assert!(err.to_string().contains("80"));
    }
}
