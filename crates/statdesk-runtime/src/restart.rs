//! Opt-in restart policy layered on supervisor exit events.

use std::sync::Arc;

use statdesk_core::RestartPolicy;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::process::{BackendEvent, BackendSupervisor, LaunchPlan};

/// Relaunch the backend after unexpected failures according to `policy`.
///
/// Returns `None` for [`RestartPolicy::Never`]. Requested stops and clean
/// exits never trigger a restart. Cancel `cancel` before stopping the
/// supervisor so no relaunch races the shutdown.
pub fn spawn_restart_supervision(
    supervisor: Arc<BackendSupervisor>,
    plan: LaunchPlan,
    policy: RestartPolicy,
    cancel: CancellationToken,
) -> Option<JoinHandle<u32>> {
    let RestartPolicy::OnFailure {
        max_restarts,
        delay,
    } = policy
    else {
        return None;
    };

    let mut events = supervisor.subscribe();
    Some(tokio::spawn(async move {
        let mut restarts: u32 = 0;

        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => event,
            };

            let exit = match event {
                Ok(BackendEvent::Exited(exit)) => exit,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Restart supervision lagged behind backend events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !exit.is_failure() {
                continue;
            }
            if restarts >= max_restarts {
                warn!(max_restarts, "Backend restart limit reached; leaving it stopped");
                break;
            }

            restarts += 1;
            info!(
                attempt = restarts,
                max_restarts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Restarting backend after failure"
            );
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }

            match supervisor.start(&plan).await {
                Ok(pid) => {
                    if let Err(e) = supervisor.wait_until_ready().await {
                        warn!(pid, "Restarted backend not ready: {e}");
                    }
                }
                Err(e) => error!("Backend restart failed: {e}"),
            }
        }

        restarts
    }))
}
