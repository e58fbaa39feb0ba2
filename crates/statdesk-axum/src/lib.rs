//! Static asset server for the statdesk frontend.
//!
//! Serves the built single-page application over loopback HTTP:
//! - recognized file types are served with their content type
//! - every other path gets the entry document (SPA fallback)
//! - read failures answer 500 with the error text

mod assets;
pub mod mime;
mod server;

pub use assets::asset_router;
pub use server::{AssetServerError, ServerBinding, start_asset_server};
