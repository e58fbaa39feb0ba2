//! Standalone backend runner.
//!
//! Starts only the backend, waits for it to answer its readiness probe and
//! keeps it running until Ctrl-C. Used while working on the frontend with a
//! separate dev server.

use std::future::Future;

use statdesk_core::AppConfig;
use statdesk_runtime::{BackendSupervisor, resolve_launch_plan};
use tracing::{info, warn};

use crate::error::CliError;

/// Execute the backend command.
///
/// Fails with a non-zero exit when the backend does not become ready within
/// the configured bound, or when it exits with a failure on its own.
pub async fn execute<F>(config: &AppConfig, interrupt: F) -> Result<(), CliError>
where
    F: Future<Output = ()>,
{
    let plan = resolve_launch_plan(config)?;
    let supervisor = BackendSupervisor::new(&config.backend);
    let pid = supervisor.start(&plan).await?;
    info!(pid, url = %config.backend.base_url(), "Backend started");

    tokio::pin!(interrupt);

    let ready = tokio::select! {
        ready = supervisor.wait_until_ready() => ready,
        () = &mut interrupt => {
            info!("Interrupted before the backend was ready");
            supervisor.stop().await?;
            return Ok(());
        }
    };
    if let Err(e) = ready {
        // A timed-out backend is still running; do not leave it behind
        supervisor.stop().await?;
        return Err(e.into());
    }
    info!(url = %config.backend.base_url(), "Backend ready; press Ctrl-C to stop");

    tokio::select! {
        exit = supervisor.wait_for_exit() => {
            let exit = exit?;
            if exit.is_failure() {
                return Err(CliError::BackendExited(exit.status_text()));
            }
            warn!(status = %exit.status_text(), "Backend exited on its own");
            Ok(())
        }
        () = &mut interrupt => {
            info!("Stopping backend");
            supervisor.stop().await?;
            Ok(())
        }
    }
}
