//! Core domain types and port definitions for statdesk.
//!
//! This crate holds everything that can be reasoned about without touching
//! processes or sockets:
//! - Backend executable naming and installation-layout discovery (`paths`)
//! - Readiness and lifecycle state machines
//! - Resolved application configuration
//! - Ports for the UI surface and backend log sinks

pub mod config;
pub mod lifecycle;
pub mod paths;
pub mod ports;
pub mod readiness;

pub use config::{
    AppConfig, AssetConfig, BackendConfig, ConfigError, CREDENTIAL_ENV, DEFAULT_ASSET_PORT,
    DEFAULT_BACKEND_PORT, DEFAULT_LOCALE, DEFAULT_PROBE_INTERVAL, DEFAULT_READY_TIMEOUT_SECS,
    DEV_ENTRY_SCRIPT, ENTRY_DOCUMENT, LaunchMode, READY_BANNER, RestartPolicy,
};
pub use lifecycle::LifecyclePhase;
pub use paths::{
    BACKEND_DIR_NAME, ExecutableLocator, ExecutableNaming, FileProbe, InstallRoots,
    InstallationLayout, Location, OsFileProbe, PathError, Platform, application_dir,
    default_log_dir,
};
pub use ports::{BackendLogSinkPort, NoopLogSink, OutputStream, SurfaceRequest, UiSurface};
pub use readiness::ReadinessState;

#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
