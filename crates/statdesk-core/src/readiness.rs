//! Backend readiness state.

use serde::{Deserialize, Serialize};

/// Whether the backend is confirmed able to serve requests.
///
/// Transitions only move forward through [`advance`](Self::advance). The one
/// exception is a process restart, which goes through
/// [`restarted`](Self::restarted) explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// No backend process has been launched.
    #[default]
    NotStarted,
    /// A process is running but has not answered the readiness probe.
    Starting,
    /// The backend answered `GET /` with 200.
    Ready,
}

impl ReadinessState {
    const fn rank(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Starting => 1,
            Self::Ready => 2,
        }
    }

    /// Move to `next` if it is further along; otherwise stay put.
    #[must_use]
    pub const fn advance(self, next: Self) -> Self {
        if next.rank() > self.rank() { next } else { self }
    }

    /// State after the backend process has been relaunched.
    #[must_use]
    pub const fn restarted(self) -> Self {
        Self::Starting
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
