//! Backend output capture.
//!
//! Lines are kept in a bounded ring buffer (for crash reports) and
//! broadcast to live subscribers.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statdesk_core::{BackendLogSinkPort, OutputStream};
use tokio::sync::broadcast;

/// Lines retained for the unexpected-exit report.
pub const RECENT_LINES: usize = 200;

const BROADCAST_CAPACITY: usize = 1000;

/// One line of backend output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub stream: OutputStream,
    pub line: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stream, self.line)
    }
}

/// Ring buffer plus broadcast channel for backend output.
pub struct BackendLog {
    lines: RwLock<VecDeque<LogLine>>,
    capacity: usize,
    broadcast_tx: broadcast::Sender<LogLine>,
}

impl BackendLog {
    pub fn new() -> Self {
        Self::with_capacity(RECENT_LINES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            lines: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            broadcast_tx,
        }
    }

    pub fn push(&self, stream: OutputStream, line: String) {
        let entry = LogLine {
            timestamp: Utc::now(),
            stream,
            line,
        };

        {
            let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(entry.clone());
        }

        // No receivers is fine
        let _ = self.broadcast_tx.send(entry);
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn recent(&self) -> Vec<LogLine> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.broadcast_tx.subscribe()
    }

    /// Drop retained lines (called when a new process is launched).
    pub fn clear(&self) {
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for BackendLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackendLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendLog")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl BackendLogSinkPort for BackendLog {
    fn append(&self, stream: OutputStream, line: String) {
        self.push(stream, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_lines() {
        let log = BackendLog::with_capacity(3);
        for i in 0..5 {
            log.push(OutputStream::Stdout, format!("line {i}"));
        }
        let lines: Vec<String> = log.recent().into_iter().map(|l| l.line).collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
    }

    #[tokio::test]
    async fn subscribers_receive_new_lines() {
        let log = BackendLog::new();
        let mut rx = log.subscribe();
        log.append(OutputStream::Stderr, "boom".to_string());
        let line = rx.recv().await.unwrap();
        assert_eq!(line.stream, OutputStream::Stderr);
        assert_eq!(line.to_string(), "[stderr] boom");
    }

    #[test]
    fn clear_empties_buffer() {
        let log = BackendLog::new();
        log.push(OutputStream::Stdout, "x".to_string());
        log.clear();
        assert!(log.recent().is_empty());
    }
}
