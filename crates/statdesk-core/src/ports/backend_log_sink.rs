//! Backend log sink port.
//!
//! Every line the backend writes to stdout or stderr is forwarded to a sink.
//! The runtime keeps a ring buffer for crash reports; the binary also mirrors
//! lines into `tracing`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which standard stream a backend line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for appending backend output lines to a sink.
///
/// Implementations must be thread-safe and must not block.
pub trait BackendLogSinkPort: Send + Sync {
    /// Append one line (without trailing newline) from the backend.
    fn append(&self, stream: OutputStream, line: String);
}

/// Sink that discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl BackendLogSinkPort for NoopLogSink {
    fn append(&self, _stream: OutputStream, _line: String) {}
}
