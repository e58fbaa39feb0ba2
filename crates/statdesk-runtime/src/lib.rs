//! Backend process runtime for statdesk.
//!
//! Everything that touches the OS on the backend side lives here: resolving
//! what to launch, supervising the child, probing readiness over HTTP and
//! the opt-in restart policy.

pub mod health;
pub mod process;
pub mod restart;

pub use health::ReadinessProbe;
pub use process::{
    BackendEvent, BackendExit, BackendLog, BackendSupervisor, LaunchPlan, LogLine,
    RunningBackend, SupervisorError, find_interpreter, resolve_launch_plan,
};
pub use restart::spawn_restart_supervision;

#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
