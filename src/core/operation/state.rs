//=========================================================================
// Operation State
//=========================================================================
//
// Four-state lifecycle shared by every operation variant.
//
// Ordering:
//   Waiting < Running < Cancelled < Completed
//
// Guards compare against `Running` ("at most running" vs "exactly
// running"), so the derive order matters.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== OperationState ======================================================

/// Lifecycle state of an operation.
///
/// `Cancelled` and `Completed` are terminal: once reached, an operation
/// never changes state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum OperationState {
    /// Created but not started.
    #[default]
    Waiting,

    /// Started, not yet resolved.
    Running,

    /// Ended abnormally, possibly carrying an error.
    Cancelled,

    /// Ended successfully.
    Completed,
}

impl OperationState {
    /// Returns true for `Cancelled` and `Completed`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
