//! statdesk desktop launcher.
//!
//! The composition root for a run: parses the CLI, builds the
//! [`AppConfig`](statdesk_core::AppConfig), and drives the backend
//! supervisor, the asset server and the UI surface through the
//! [`Coordinator`](lifecycle::Coordinator).

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod parser;
pub mod signals;
pub mod surface;

pub use bootstrap::{build_config, config_from_args, init_tracing};
pub use error::CliError;
pub use lifecycle::{Coordinator, LifecycleError, SHUTDOWN_BOUND};
pub use parser::{Cli, Commands, LaunchArgs};
pub use signals::shutdown_signal;
pub use surface::{BrowserSurface, HeadlessSurface};
