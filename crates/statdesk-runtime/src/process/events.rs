//! Backend lifecycle events.
//!
//! The supervisor publishes these on a broadcast channel; the coordinator,
//! the restart policy and loggers consume them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::logs::LogLine;

/// How a backend process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendExit {
    pub pid: u32,
    /// Exit code, absent when terminated by a signal.
    pub code: Option<i32>,
    /// Terminating signal on Unix.
    pub signal: Option<i32>,
    /// Whether the exit followed a stop request.
    pub requested: bool,
    /// Last lines of output before the exit.
    pub recent_output: Vec<LogLine>,
}

impl BackendExit {
    /// Non-zero or signal-terminated exit that nobody asked for.
    pub const fn is_failure(&self) -> bool {
        !self.requested && !matches!(self.code, Some(0))
    }

    pub fn status_text(&self) -> String {
        match (self.code, self.signal) {
            (Some(code), _) => format!("exit code {code}"),
            (None, Some(signal)) => format!("signal {signal}"),
            (None, None) => "unknown status".to_string(),
        }
    }
}

impl fmt::Display for BackendExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} ended with {}", self.pid, self.status_text())
    }
}

/// Supervisor lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendEvent {
    /// A process was spawned.
    Started { pid: u32 },
    /// The startup banner appeared in the output.
    BannerSeen,
    /// The HTTP readiness probe succeeded.
    Ready,
    /// The process ended.
    Exited(BackendExit),
}
