//=========================================================================
// Operation Builder
//
// Configuration entry point for every operation variant.
//
// Architecture:
// ```text
//     OperationBuilder ──managed()────> ManagedOperation
//         │            ──returning()──> ManagedReturnOperation<T>
//         │            ──coroutine()──> CoroutineOperation
//         ├─ with_run_on_create()
//         ├─ with_label()
//         └─ with_sink()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::diagnostics::{DiagnosticSink, LogSink};
use crate::core::operation::{
    CoroutineOperation, Lifecycle, ManagedOperation, ManagedReturnOperation,
};
use crate::core::scheduler::{Scheduler, Sequence};

//=== OperationBuilder ====================================================

/// Builder for configuring and constructing operations.
///
/// # Default Values
///
/// - **Run on create**: false
/// - **Label**: `"operation"`
/// - **Sink**: [`LogSink`]
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use aetheric_operations::prelude::*;
///
/// let op = OperationBuilder::new()
///     .with_label("load-level")
///     .with_run_on_create(true)
///     .with_sink(Rc::new(NullSink))
///     .managed();
///
/// assert!(op.is_running());
/// assert_eq!(op.label(), "load-level");
/// ```
pub struct OperationBuilder {
    run_on_create: bool,
    label: String,
    sink: Rc<dyn DiagnosticSink>,
}

impl OperationBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            run_on_create: false,
            label: String::from("operation"),
            sink: Rc::new(LogSink),
        }
    }

    /// Starts the operation as part of construction.
    ///
    /// Default: false
    pub fn with_run_on_create(mut self, run_on_create: bool) -> Self {
        self.run_on_create = run_on_create;
        self
    }

    /// Sets the label used in log lines and diagnostic reports.
    ///
    /// # Panics
    ///
    /// Panics if `label` is empty.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        assert!(!label.is_empty(), "Operation label must not be empty");
        self.label = label;
        self
    }

    /// Sets the sink receiving cancellation errors.
    ///
    /// Default: [`LogSink`]
    pub fn with_sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    //--- Construction -----------------------------------------------------

    /// Builds an operation completed by the caller.
    pub fn managed(self) -> ManagedOperation {
        let run_on_create = self.run_on_create;
        ManagedOperation::from_lifecycle(self.lifecycle(run_on_create))
    }

    /// Builds an operation completed with a value of type `T`.
    pub fn returning<T: 'static>(self) -> ManagedReturnOperation<T> {
        let run_on_create = self.run_on_create;
        ManagedReturnOperation::from_lifecycle(self.lifecycle(run_on_create))
    }

    /// Builds an operation completed when `sequence` finishes on `scheduler`.
    ///
    /// A `None` sequence yields an operation that is already completed.
    pub fn coroutine(
        self,
        scheduler: Rc<dyn Scheduler>,
        sequence: Option<Box<dyn Sequence>>,
    ) -> CoroutineOperation {
        let run_on_create = self.run_on_create;
        let managed = ManagedOperation::from_lifecycle(self.lifecycle(false));
        CoroutineOperation::from_parts(managed, Some(scheduler), sequence, run_on_create)
    }

    fn lifecycle(self, run_on_create: bool) -> Lifecycle {
        Lifecycle::new(self.label, self.sink, run_on_create)
    }
}

impl Default for OperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
