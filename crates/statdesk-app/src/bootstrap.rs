//! Composition root helpers: tracing setup and launch configuration.
//!
//! Everything here runs once, before any command handler.

use std::path::{Path, PathBuf};
use std::time::Duration;

use statdesk_core::{
    AppConfig, InstallRoots, LaunchMode, RestartPolicy, application_dir, default_log_dir,
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::CliError;
use crate::parser::LaunchArgs;

/// Relaunch attempts allowed per run when `--restart` is set.
pub const DEFAULT_MAX_RESTARTS: u32 = 3;

/// Pause before each relaunch.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(2);

/// Install the global subscriber: stderr plus a daily rolling log file.
///
/// `RUST_LOG` wins over `verbose`. The returned guard flushes the file
/// writer and must be held until the process exits.
pub fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file_writer() {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false) // No ANSI colors in files
                    .compact(),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .try_init();

    if let Err(e) = installed {
        eprintln!("Failed to initialize logging: {e}");
    }
    guard
}

fn log_file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let log_dir = match default_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Logging to file disabled: {e}");
            return None;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {e}", log_dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "statdesk");
    Some(tracing_appender::non_blocking(file_appender))
}

/// Resolve the launch configuration for this executable.
pub fn build_config(args: &LaunchArgs) -> Result<AppConfig, CliError> {
    let app_dir = application_dir()?;
    config_from_args(args, &app_dir)
}

/// Apply `args` on top of the defaults derived from `app_dir`.
pub fn config_from_args(args: &LaunchArgs, app_dir: &Path) -> Result<AppConfig, CliError> {
    let primary = args
        .resource_dir
        .clone()
        .unwrap_or_else(|| app_dir.to_path_buf());
    let roots = InstallRoots::new(primary, app_dir);
    let mut config = AppConfig::from_roots(LaunchMode::from_dev_flag(args.is_dev()), roots);

    if let Some(document_root) = &args.document_root {
        config.assets.document_root = absolutize(document_root);
    }
    if let Some(source) = &args.backend_source {
        config.backend.source_dir = absolutize(source);
    }
    config.backend.port = args.backend_port;
    config.backend.ready_timeout = Duration::from_secs(args.ready_timeout_secs);
    config.backend.python.clone_from(&args.python);
    if args.restart {
        config.backend.restart = RestartPolicy::OnFailure {
            max_restarts: DEFAULT_MAX_RESTARTS,
            delay: DEFAULT_RESTART_DELAY,
        };
    }
    config.assets.port = args.asset_port;

    config.validate()?;
    Ok(config)
}

/// Relative overrides are taken from the invoking shell's directory.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
