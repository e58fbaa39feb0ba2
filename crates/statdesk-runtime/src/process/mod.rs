//! Backend process management.
//!
//! # Structure
//!
//! - `LaunchPlan` / `resolve_launch_plan` - what to spawn, per launch mode
//! - `BackendSupervisor` - spawning, output capture, exit watching, stop
//! - `BackendEvent` / `BackendExit` - lifecycle notifications
//! - `BackendLog` - ring buffer of recent output
//! - `shutdown_child` - SIGTERM → SIGKILL escalation

mod error;
mod events;
mod logs;
mod plan;
pub mod shutdown;
mod stream;
mod supervisor;

pub use error::SupervisorError;
pub use events::{BackendEvent, BackendExit};
pub use logs::{BackendLog, LogLine, RECENT_LINES};
pub use plan::{LaunchPlan, backend_environment, find_interpreter, resolve_launch_plan};
pub use shutdown::shutdown_child;
pub use supervisor::{BackendSupervisor, RunningBackend};
