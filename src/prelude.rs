//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_operations::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Configuration
pub use crate::builder::OperationBuilder;

// Operations
pub use crate::core::operation::{
    Completable, CoroutineOperation, ManagedOperation, ManagedReturnOperation, Operation,
    OperationError, OperationState, Severity,
};

// Scheduling
pub use crate::core::scheduler::{
    DriverExit, Scheduler, Sequence, SequenceHandle, Step, TickDriver, TickScheduler,
};

// Diagnostics
pub use crate::core::diagnostics::{ChannelSink, DiagnosticReport, DiagnosticSink, LogSink, NullSink};

// Easing
pub use crate::core::easing::Easing;
