//! Resolved application configuration.
//!
//! These are pure domain types; the binary fills them from CLI flags and
//! `STATDESK_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::{ExecutableNaming, InstallRoots};

/// Default loopback port the backend listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 8000;

/// Default loopback port for the static asset server.
pub const DEFAULT_ASSET_PORT: u16 = 5180;

/// Default bound on waiting for backend readiness.
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 30;

/// Default interval between readiness probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Line fragment the backend prints once its listener is up.
pub const READY_BANNER: &str = "Uvicorn running on";

/// Credential forwarded from the parent environment to the backend.
pub const CREDENTIAL_ENV: &str = "DASHSCOPE_API_KEY";

/// Locale handed to the backend so non-ASCII paths survive.
pub const DEFAULT_LOCALE: &str = "zh_CN.UTF-8";

/// SPA shell served for every unmatched path.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Script run by the interpreter in development mode.
pub const DEV_ENTRY_SCRIPT: &str = "main.py";

/// How the backend is launched. Chosen by flag, never detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Interpreter + script from the backend source tree.
    Development,
    /// Packaged executable found by the locator.
    Production,
}

impl LaunchMode {
    pub const fn from_dev_flag(dev: bool) -> Self {
        if dev { Self::Development } else { Self::Production }
    }

    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// What to do when the backend exits on its own with a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Report the exit and leave the backend down.
    #[default]
    Never,
    /// Relaunch after `delay`, at most `max_restarts` times per run.
    OnFailure { max_restarts: u32, delay: Duration },
}

/// Backend process settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Loopback port the backend is expected to open.
    pub port: u16,
    /// Naming rule for the packaged executable.
    pub naming: ExecutableNaming,
    /// Backend source root used in development mode.
    pub source_dir: PathBuf,
    /// Interpreter override for development mode.
    pub python: Option<String>,
    /// Value for `LANG` in the backend environment.
    pub locale: String,
    /// Startup banner logged as a readiness signal.
    pub ready_banner: String,
    pub ready_timeout: Duration,
    pub probe_interval: Duration,
    pub restart: RestartPolicy,
}

impl BackendConfig {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_BACKEND_PORT,
            naming: ExecutableNaming::backend_server(),
            source_dir: source_dir.into(),
            python: None,
            locale: DEFAULT_LOCALE.to_string(),
            ready_banner: READY_BANNER.to_string(),
            ready_timeout: Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            restart: RestartPolicy::Never,
        }
    }

    /// Base URL the frontend uses to reach the backend.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Dev-mode script path.
    pub fn dev_script(&self) -> PathBuf {
        self.source_dir.join(DEV_ENTRY_SCRIPT)
    }
}

/// Static asset server settings.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub document_root: PathBuf,
    pub entry_document: String,
    /// Loopback port; `0` lets the OS choose.
    pub port: u16,
}

impl AssetConfig {
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self {
            document_root: document_root.into(),
            entry_document: ENTRY_DOCUMENT.to_string(),
            port: DEFAULT_ASSET_PORT,
        }
    }

    pub fn entry_path(&self) -> PathBuf {
        self.document_root.join(&self.entry_document)
    }
}

/// Everything the coordinator needs for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: LaunchMode,
    pub roots: InstallRoots,
    pub backend: BackendConfig,
    pub assets: AssetConfig,
    /// Optional window icon handed to the UI surface.
    pub icon: Option<PathBuf>,
}

impl AppConfig {
    /// Config with defaults derived from the install roots.
    ///
    /// - document root: `<primary>/frontend/dist`
    /// - backend source: `<app_dir>/../backend`
    /// - icon: `<primary>/icon.png` when it exists
    pub fn from_roots(mode: LaunchMode, roots: InstallRoots) -> Self {
        let document_root = roots.primary.join("frontend").join("dist");
        let source_dir = roots.app_dir.join("..").join("backend");
        let icon = Some(roots.primary.join("icon.png")).filter(|p| p.is_file());
        Self {
            mode,
            backend: BackendConfig::new(source_dir),
            assets: AssetConfig::new(document_root),
            roots,
            icon,
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.backend.port, false)?;
        validate_port(self.assets.port, true)?;

        if self.assets.port != 0 && self.assets.port == self.backend.port {
            return Err(ConfigError::PortConflict(self.assets.port));
        }
        if self.backend.ready_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("ready timeout"));
        }
        if self.backend.probe_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("probe interval"));
        }
        if self.assets.entry_document.trim().is_empty()
            || Path::new(&self.assets.entry_document).components().count() != 1
        {
            return Err(ConfigError::InvalidEntryDocument(
                self.assets.entry_document.clone(),
            ));
        }
        Ok(())
    }
}

fn validate_port(port: u16, allow_ephemeral: bool) -> Result<(), ConfigError> {
    if port == 0 && allow_ephemeral {
        return Ok(());
    }
    if port < 1024 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Port {0} is privileged or invalid. Please use a port >= 1024.")]
    InvalidPort(u16),

    #[error("Asset server and backend cannot share port {0}")]
    PortConflict(u16),

    #[error("The {0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Entry document must be a plain file name, got {0:?}")]
    InvalidEntryDocument(String),

    #[error("Cannot resolve application directories: {0}")]
    Paths(String),
}
