//! Full application run: backend, asset server and UI surface.

use std::future::Future;

use statdesk_core::{AppConfig, UiSurface};

use crate::error::CliError;
use crate::lifecycle::Coordinator;
use crate::surface::{BrowserSurface, HeadlessSurface};

/// Execute the run command until the surface closes or `interrupt` fires.
pub async fn execute<F>(config: AppConfig, headless: bool, interrupt: F) -> Result<(), CliError>
where
    F: Future<Output = ()>,
{
    let surface: Box<dyn UiSurface> = if headless {
        Box::new(HeadlessSurface)
    } else {
        Box::new(BrowserSurface)
    };

    let mut coordinator = Coordinator::new(config);
    coordinator.run(surface.as_ref(), interrupt).await?;
    Ok(())
}
