//! Platform identification and the executable naming rule.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::PathError;

/// Operating system family the backend executable was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    /// Any other identifier, kept lowercased.
    Other(String),
}

impl Platform {
    /// The platform this binary is running on.
    pub fn current() -> Self {
        Self::from_identifier(env::consts::OS)
    }

    /// Parse a platform identifier.
    ///
    /// Accepts both Rust's `std::env::consts::OS` names (`windows`, `macos`)
    /// and the Node-style names used by packaging scripts (`win32`, `darwin`).
    pub fn from_identifier(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win64" => Self::Windows,
            "macos" | "darwin" | "osx" => Self::MacOs,
            "linux" => Self::Linux,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Other(id) => id,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform rule for building the backend executable's file name.
///
/// Some platforms append a suffix (`.exe` on Windows), others use the bare
/// stem. The rule is configuration so call sites never branch on platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableNaming {
    stem: String,
    suffixes: HashMap<Platform, String>,
}

impl ExecutableNaming {
    /// A naming rule with no platform suffixes.
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            suffixes: HashMap::new(),
        }
    }

    /// Append `suffix` to the stem when building for `platform`.
    #[must_use]
    pub fn with_suffix(mut self, platform: Platform, suffix: impl Into<String>) -> Self {
        self.suffixes.insert(platform, suffix.into());
        self
    }

    /// The packaged backend: `backend-server`, `backend-server.exe` on Windows.
    pub fn backend_server() -> Self {
        Self::new("backend-server").with_suffix(Platform::Windows, ".exe")
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Executable file name for `platform`.
    pub fn file_name(&self, platform: &Platform) -> String {
        match self.suffixes.get(platform) {
            Some(suffix) => format!("{}{}", self.stem, suffix),
            None => self.stem.clone(),
        }
    }
}

impl Default for ExecutableNaming {
    fn default() -> Self {
        Self::backend_server()
    }
}

/// Directory containing the running application executable.
pub fn application_dir() -> Result<PathBuf, PathError> {
    let exe = env::current_exe().map_err(|e| PathError::NoExecutablePath(e.to_string()))?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or(PathError::NoParent(exe))
}

/// Default directory for the application's own log files.
///
/// `STATDESK_LOG_DIR` wins, otherwise `<data_local_dir>/statdesk/logs`.
pub fn default_log_dir() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("STATDESK_LOG_DIR") {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("statdesk").join("logs"))
}
