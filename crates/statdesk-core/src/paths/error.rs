//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving application directories.
#[derive(Debug, Error)]
pub enum PathError {
    /// The running executable's path could not be determined.
    #[error("Cannot determine application executable path: {0}")]
    NoExecutablePath(String),

    /// The executable path has no parent directory.
    #[error("{0} has no parent directory")]
    NoParent(PathBuf),

    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,
}
