//! Application lifecycle coordination.
//!
//! The [`Coordinator`] owns the backend supervisor and the asset server
//! binding for one run and moves through
//! `Idle → Launching → Serving → Ready → ShuttingDown → Terminated`.
//!
//! Key design decisions:
//! - **Backend failures degrade**: a missing or crashing backend is logged
//!   and the frontend is still served
//! - **Bind failures abort**: without an asset server there is nothing to show
//! - **Teardown always runs**: every path out of [`Coordinator::run`] goes
//!   through [`Coordinator::shutdown`], which releases both resources

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use statdesk_axum::{AssetServerError, ServerBinding, start_asset_server};
use statdesk_core::{AppConfig, LifecyclePhase, SurfaceRequest, UiSurface};
use statdesk_runtime::{BackendSupervisor, resolve_launch_plan, spawn_restart_supervision};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on releasing the backend and the asset server together.
pub const SHUTDOWN_BOUND: Duration = Duration::from_secs(8);

/// Errors from the application lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: LifecyclePhase,
        to: LifecyclePhase,
    },

    /// The asset server could not start; startup is aborted.
    #[error(transparent)]
    AssetServer(#[from] AssetServerError),

    #[error("Failed to open UI surface: {0}")]
    Surface(String),

    /// One or both resources were not released cleanly.
    #[error("Shutdown incomplete: {0}")]
    Teardown(String),
}

/// Owner of every resource of a single application run.
pub struct Coordinator {
    config: AppConfig,
    supervisor: Arc<BackendSupervisor>,
    binding: Option<ServerBinding>,
    phase: watch::Sender<LifecyclePhase>,
    background: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    restart: Option<JoinHandle<u32>>,
}

impl Coordinator {
    pub fn new(config: AppConfig) -> Self {
        let supervisor = Arc::new(BackendSupervisor::new(&config.backend));
        let (phase, _) = watch::channel(LifecyclePhase::Idle);
        Self {
            config,
            supervisor,
            binding: None,
            phase,
            background: CancellationToken::new(),
            tasks: Vec::new(),
            restart: None,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.borrow()
    }

    /// Observe phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<LifecyclePhase> {
        self.phase.subscribe()
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The backend supervisor, for observers of backend events and logs.
    pub const fn supervisor(&self) -> &Arc<BackendSupervisor> {
        &self.supervisor
    }

    /// Base URL the frontend uses to reach the backend.
    pub fn backend_url(&self) -> String {
        self.config.backend.base_url()
    }

    /// URL of the asset server while it is bound.
    pub fn asset_url(&self) -> Option<String> {
        self.binding.as_ref().map(ServerBinding::url)
    }

    /// Start everything, wait for the surface to close or `interrupt` to
    /// fire, then shut down.
    ///
    /// Shutdown runs on every path, including startup errors. The first
    /// error wins.
    pub async fn run<F>(
        &mut self,
        surface: &dyn UiSurface,
        interrupt: F,
    ) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.start_and_wait(surface) => result,
            () = interrupt => {
                info!("Interrupted; shutting down");
                Ok(())
            }
        };

        let teardown = self.shutdown().await;
        outcome.and(teardown)
    }

    async fn start_and_wait(&mut self, surface: &dyn UiSurface) -> Result<(), LifecycleError> {
        self.start(surface).await?;
        surface.closed().await;
        info!("UI surface closed");
        Ok(())
    }

    /// Launch the backend, bind the asset server and open `surface`.
    ///
    /// On error the caller must still call [`shutdown`](Self::shutdown).
    pub async fn start(&mut self, surface: &dyn UiSurface) -> Result<(), LifecycleError> {
        self.transition(LifecyclePhase::Launching)?;
        info!(
            mode = ?self.config.mode,
            backend_url = %self.backend_url(),
            "Launching backend"
        );
        self.launch_backend().await;

        self.transition(LifecyclePhase::Serving)?;
        let binding = start_asset_server(&self.config.assets)
            .await
            .inspect_err(|e| error!("Asset server failed to start: {e}"))?;
        let request = SurfaceRequest {
            url: binding.url(),
            backend_url: self.backend_url(),
            icon: self.config.icon.clone(),
        };
        self.binding = Some(binding);

        surface.open(&request).await.map_err(|e| {
            error!("Failed to open UI surface: {e:#}");
            LifecycleError::Surface(format!("{e:#}"))
        })?;

        self.transition(LifecyclePhase::Ready)?;
        info!(url = %request.url, "Frontend ready");
        Ok(())
    }

    /// Start the backend without blocking on its readiness.
    async fn launch_backend(&mut self) {
        let plan = match resolve_launch_plan(&self.config) {
            Ok(plan) => plan,
            Err(e) => {
                error!("Backend not launched; the frontend will run without it: {e}");
                return;
            }
        };

        match self.supervisor.start(&plan).await {
            Ok(pid) => debug!(pid, "Backend launch handed off"),
            Err(e) => {
                error!("Backend failed to launch; the frontend will run without it: {e}");
                return;
            }
        }

        let supervisor = Arc::clone(&self.supervisor);
        self.tasks.push(tokio::spawn(async move {
            // Outcomes are logged by the supervisor
            let _ = supervisor.wait_until_ready().await;
        }));

        self.restart = spawn_restart_supervision(
            Arc::clone(&self.supervisor),
            plan,
            self.config.backend.restart,
            self.background.clone(),
        );
    }

    /// Release the backend process and the asset server.
    ///
    /// Both releases are attempted even if one fails, bounded by
    /// [`SHUTDOWN_BOUND`]. Calling this again is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        if matches!(
            self.phase(),
            LifecyclePhase::ShuttingDown | LifecyclePhase::Terminated
        ) {
            debug!(phase = %self.phase(), "Shutdown already done");
            return Ok(());
        }
        self.transition(LifecyclePhase::ShuttingDown)?;

        self.stop_background();

        let supervisor = Arc::clone(&self.supervisor);
        let binding = self.binding.as_mut();
        let teardown = async move {
            let backend = supervisor.stop();
            let server = async move {
                match binding {
                    Some(binding) => binding.shutdown().await,
                    None => Ok(()),
                }
            };
            tokio::join!(backend, server)
        };

        let released = timeout(SHUTDOWN_BOUND, teardown).await;
        let mut failures = Vec::new();
        match released {
            Ok((backend, server)) => {
                match backend {
                    Ok(Some(exit)) => info!(status = %exit.status_text(), "Backend stopped"),
                    Ok(None) => debug!("Backend was not running"),
                    Err(e) => {
                        error!("Failed to stop backend: {e}");
                        failures.push(format!("backend: {e}"));
                    }
                }
                if let Err(e) = server {
                    error!("Failed to stop asset server: {e}");
                    failures.push(format!("asset server: {e}"));
                }
            }
            Err(_) => {
                error!(
                    bound_secs = SHUTDOWN_BOUND.as_secs(),
                    "Shutdown did not finish in time; exiting anyway"
                );
                failures.push(format!("timed out after {}s", SHUTDOWN_BOUND.as_secs()));
            }
        }

        // Dropping the binding aborts a server the bounded teardown left behind
        self.binding = None;
        self.transition(LifecyclePhase::Terminated)?;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::Teardown(failures.join("; ")))
        }
    }

    fn stop_background(&mut self) {
        self.background.cancel();
        if let Some(restart) = self.restart.take() {
            restart.abort();
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn transition(&self, next: LifecyclePhase) -> Result<(), LifecycleError> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Rejected lifecycle transition");
            return Err(LifecycleError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        info!(from = %current, to = %next, "Lifecycle transition");
        self.phase.send_replace(next);
        Ok(())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop_background();
    }
}
