//! Lifecycle of a bulk synchronization job.

use std::fmt;

/// State of the coordinator's current (or last) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    /// No job has run, or the last one was acknowledged.
    #[default]
    Idle,
    /// A job is in flight.
    Running,
    /// The last job processed every item.
    Completed,
    /// The last job was cancelled by the user.
    Cancelled,
    /// The last job collapsed without syncing anything.
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl SyncState {
    /// Whether the state marks a finished job.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// States reachable from `from` in one step.
#[must_use]
pub fn allowed_transitions(from: SyncState) -> Vec<SyncState> {
    use SyncState::{Cancelled, Completed, Failed, Idle, Running};
    match from {
        Idle => vec![Running],
        Running => vec![Completed, Cancelled, Failed],
        Completed | Cancelled | Failed => vec![Idle],
    }
}

/// Validate a transition.
///
/// # Errors
///
/// [`crate::EditorError::InvalidTransition`] when `to` is not reachable
/// from `from`.
pub fn validate_transition(from: SyncState, to: SyncState) -> Result<(), crate::EditorError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(crate::EditorError::InvalidTransition { from, to })
    }
}
