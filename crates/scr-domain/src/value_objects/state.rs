//! Instance lifecycle states

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a managed component instance
///
/// ```text
/// INSTANTIATED ──▶ VALID ◀──▶ INVALID
///                    │           │
///                    ▼           ▼
///                 STOPPED ──▶ DISPOSED (terminal)
/// ```
///
/// `Valid`/`Invalid` are derived from the AND of all handler votes;
/// `Stopped` is forced by an explicit `stop()` regardless of votes;
/// `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstanceState {
    /// Created but not yet evaluated
    Instantiated,
    /// All handlers vote satisfied
    Valid,
    /// At least one handler votes unsatisfied
    Invalid,
    /// Explicitly stopped; votes are ignored until restarted
    Stopped,
    /// Torn down; no further transitions
    Disposed,
}

impl InstanceState {
    /// Whether the instance is running (validity is being tracked)
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid)
    }

    /// Whether this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Instantiated => "INSTANTIATED",
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::Stopped => "STOPPED",
            Self::Disposed => "DISPOSED",
        };
        f.write_str(label)
    }
}
