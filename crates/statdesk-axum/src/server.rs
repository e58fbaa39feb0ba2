//! Asset server lifecycle.
//!
//! Key design decisions:
//! - **Bind-then-report**: the listener is bound before anything is spawned,
//!   so a port conflict surfaces as an error from `start_asset_server`
//! - **Loopback only**: the listener never binds a routable interface
//! - **Owned binding**: the returned [`ServerBinding`] is the only handle;
//!   shutting it down (or dropping it) closes the listener

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use statdesk_core::AssetConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assets::asset_router;

/// Time allowed for in-flight requests to finish on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Error from asset server operations.
#[derive(Debug, Error)]
pub enum AssetServerError {
    /// The listener could not be bound (typically: port already in use).
    #[error("Failed to bind asset server to {address}: {reason}")]
    BindFailed { address: SocketAddr, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A bound, serving asset server.
#[derive(Debug)]
pub struct ServerBinding {
    addr: SocketAddr,
    document_root: PathBuf,
    cancel: CancellationToken,
    join: Option<JoinHandle<io::Result<()>>>,
}

/// Bind the loopback listener and start serving `config.document_root`.
pub async fn start_asset_server(config: &AssetConfig) -> Result<ServerBinding, AssetServerError> {
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));

    if !config.entry_path().is_file() {
        warn!(
            entry = %config.entry_path().display(),
            "Entry document missing; every request will fail with 500"
        );
    }

    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| AssetServerError::BindFailed {
            address,
            reason: e.to_string(),
        })?;
    let addr = listener
        .local_addr()
        .map_err(|e| AssetServerError::Internal(format!("Failed to get local address: {e}")))?;

    info!(
        %addr,
        document_root = %config.document_root.display(),
        "Asset server listening"
    );

    let app = asset_router(config);
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone().cancelled_owned();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    });

    Ok(ServerBinding {
        addr,
        document_root: config.document_root.clone(),
        cancel,
        join: Some(join),
    })
}

impl ServerBinding {
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// URL the UI surface should load.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Whether the serve task is still alive.
    pub fn is_serving(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Stop accepting connections and close the listener.
    ///
    /// Waits for in-flight requests up to a bound, then aborts. Calling this
    /// again after it returned is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), AssetServerError> {
        let Some(mut join) = self.join.take() else {
            debug!(addr = %self.addr, "Asset server already shut down");
            return Ok(());
        };

        info!(addr = %self.addr, "Stopping asset server");
        self.cancel.cancel();

        match timeout(SHUTDOWN_TIMEOUT, &mut join).await {
            Ok(Ok(Ok(()))) => {
                info!(addr = %self.addr, "Asset server stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!("Asset server ended with error: {e}");
                Err(AssetServerError::Internal(format!("Asset server error: {e}")))
            }
            Ok(Err(join_err)) => {
                error!("Asset server task panicked: {join_err}");
                Err(AssetServerError::Internal(format!(
                    "Task panicked: {join_err}"
                )))
            }
            Err(_) => {
                warn!("Asset server stop timed out; aborting task");
                join.abort();
                // The listener is owned by the task; wait until it is dropped
                let _ = join.await;
                Err(AssetServerError::Internal(
                    "Asset server stop timed out; task aborted".into(),
                ))
            }
        }
    }
}

impl Drop for ServerBinding {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            self.cancel.cancel();
            join.abort();
        }
    }
}
