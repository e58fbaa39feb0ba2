//! Application lifecycle phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of a single application run.
///
/// `Idle → Launching → Serving → Ready → ShuttingDown → Terminated`, with
/// `ShuttingDown` reachable from every phase before it so that startup
/// failures still release their resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    #[default]
    Idle,
    /// Backend supervisor is being started.
    Launching,
    /// Asset server is being bound.
    Serving,
    /// UI surface has been pointed at the asset server.
    Ready,
    ShuttingDown,
    Terminated,
}

impl LifecyclePhase {
    /// Whether moving from `self` to `next` is a legal transition.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Launching)
                | (Self::Launching, Self::Serving)
                | (Self::Serving, Self::Ready)
                | (
                    Self::Idle | Self::Launching | Self::Serving | Self::Ready,
                    Self::ShuttingDown
                )
                | (Self::ShuttingDown, Self::Terminated)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Launching => "launching",
            Self::Serving => "serving",
            Self::Ready => "ready",
            Self::ShuttingDown => "shutting_down",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let path = [
            LifecyclePhase::Idle,
            LifecyclePhase::Launching,
            LifecyclePhase::Serving,
            LifecyclePhase::Ready,
            LifecyclePhase::ShuttingDown,
            LifecyclePhase::Terminated,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn shutdown_reachable_before_ready() {
        assert!(LifecyclePhase::Idle.can_transition_to(LifecyclePhase::ShuttingDown));
        assert!(LifecyclePhase::Launching.can_transition_to(LifecyclePhase::ShuttingDown));
        assert!(LifecyclePhase::Serving.can_transition_to(LifecyclePhase::ShuttingDown));
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(!LifecyclePhase::Idle.can_transition_to(LifecyclePhase::Ready));
        assert!(!LifecyclePhase::Ready.can_transition_to(LifecyclePhase::Launching));
        assert!(!LifecyclePhase::Terminated.can_transition_to(LifecyclePhase::ShuttingDown));
        assert!(!LifecyclePhase::Ready.can_transition_to(LifecyclePhase::Terminated));
    }
}
