//! UI surface port.
//!
//! A surface is whatever ends up showing the frontend: a browser tab, a
//! webview window, or nothing at all in headless runs.

use std::future;
use std::path::PathBuf;

use async_trait::async_trait;

/// What the surface should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    /// Asset server URL serving the frontend.
    pub url: String,
    /// Backend base URL the frontend talks to.
    pub backend_url: String,
    /// Optional window icon.
    pub icon: Option<PathBuf>,
}

/// Display target for the frontend.
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Point the surface at `request.url`.
    async fn open(&self, request: &SurfaceRequest) -> anyhow::Result<()>;

    /// Resolves when the user closes the surface.
    ///
    /// Surfaces that cannot observe closing never resolve; the run then
    /// ends on an interrupt instead.
    async fn closed(&self) {
        future::pending::<()>().await;
    }
}
