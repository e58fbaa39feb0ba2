//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define what the coordinator and supervisor expect from the outside
//! world. They use only domain types.
//!
//! # Design Rules
//!
//! - No process, socket or windowing types in any signature
//! - The UI surface is an intent ("show this URL"), not a toolkit binding

pub mod backend_log_sink;
pub mod ui_surface;

pub use backend_log_sink::{BackendLogSinkPort, NoopLogSink, OutputStream};
pub use ui_surface::{SurfaceRequest, UiSurface};
