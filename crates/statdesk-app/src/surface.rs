//! UI surface implementations.

use anyhow::Context;
use async_trait::async_trait;
use statdesk_core::{SurfaceRequest, UiSurface};
use tracing::{debug, info};

/// Opens the frontend in the system's default browser.
///
/// A browser tab cannot report being closed, so runs using this surface end
/// on Ctrl-C.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSurface;

#[async_trait]
impl UiSurface for BrowserSurface {
    async fn open(&self, request: &SurfaceRequest) -> anyhow::Result<()> {
        if let Some(icon) = &request.icon {
            debug!(icon = %icon.display(), "Browser surfaces ignore the window icon");
        }
        info!(url = %request.url, backend = %request.backend_url, "Opening frontend in browser");
        open::that_detached(&request.url)
            .with_context(|| format!("Failed to open {} in a browser", request.url))?;
        info!("Press Ctrl-C to quit");
        Ok(())
    }
}

/// Serves without showing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessSurface;

#[async_trait]
impl UiSurface for HeadlessSurface {
    async fn open(&self, request: &SurfaceRequest) -> anyhow::Result<()> {
        info!(
            url = %request.url,
            backend = %request.backend_url,
            "Headless run; frontend available (Ctrl-C to quit)"
        );
        Ok(())
    }
}
