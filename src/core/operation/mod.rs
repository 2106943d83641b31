//=========================================================================
// Operation Framework
//=========================================================================
//
// Cancellable, completable units of work with continuation callbacks.
//
// Architecture:
//   Operation (trait)            state queries, run, cancel, on-cancel
//     ├─ Completable (trait)     complete, on-complete, on-end
//     │    ├─ ManagedOperation     completed by the caller
//     │    └─ CoroutineOperation   completed when its sequence finishes
//     └─ ManagedReturnOperation<T> completed with a typed result
//
// Lifecycle:
//   Waiting ──run()──> Running ──complete()──> Completed
//                         └──────cancel()────> Cancelled
//
// Late registration: a handler registered after the state it waits for
// has been reached fires immediately, with the same arguments it would
// have received had it been registered earlier.
//
// Re-entrancy: the terminal state is written and handler lists are
// drained before any handler runs. Handlers may freely query or
// register on the operation that fired them (late registration replays
// immediately) and may drive other operations.
//
//=========================================================================

//=== Module Declarations =================================================

mod callback_list;
mod coroutine;
mod error;
mod lifecycle;
mod managed;
mod managed_return;
mod state;

//=== Public API ==========================================================

pub use callback_list::CallbackList;
pub use coroutine::CoroutineOperation;
pub use error::{OperationError, Severity};
pub use managed::ManagedOperation;
pub use managed_return::{ManagedReturnOperation, ResultEndHandler, ResultHandler};
pub use state::OperationState;

pub(crate) use lifecycle::Lifecycle;

//=== Handler Types =======================================================

/// Handler fired on cancellation with the stored error, if any.
pub type CancelHandler = dyn FnOnce(Option<&OperationError>);

/// Handler fired on successful completion.
pub type CompleteHandler = dyn FnOnce();

/// Handler fired on either terminal transition with `(success, error)`.
pub type EndHandler = dyn FnOnce(bool, Option<&OperationError>);

//=== Operation Trait =====================================================

/// A cancellable unit of work with a four-state lifecycle.
///
/// Implementors are cheap handles: cloning one yields another handle to
/// the same operation.
///
/// ```
/// use aetheric_operations::prelude::*;
///
/// let op = ManagedOperation::new(true);
/// op.cancel(Some(OperationError::error("asset missing")));
///
/// op.continue_with_on_cancel(|err| {
///     assert_eq!(err.map(|e| e.message()), Some("asset missing"));
/// });
/// assert!(op.is_cancelled() && op.is_ended());
/// ```
pub trait Operation {
    /// Current lifecycle state.
    fn state(&self) -> OperationState;

    /// Error stored by cancellation, if any.
    fn error(&self) -> Option<OperationError>;

    /// `Waiting → Running`. No-op once started. Returns `self` for chaining.
    fn run(&self) -> &Self
    where
        Self: Sized;

    /// Variant-specific cancellation.
    ///
    /// Must have effect at most once, must store `error` before firing
    /// cancellation handlers and must report a present error to the
    /// diagnostic sink.
    fn on_cancel(&self, error: Option<OperationError>);

    /// Cancels the operation. Calls after a terminal state are no-ops.
    fn cancel(&self, error: Option<OperationError>) {
        self.on_cancel(error)
    }

    /// Registers a handler fired on cancellation.
    ///
    /// Fires immediately with the stored error if the operation is already
    /// cancelled. Never fires if the operation completes.
    fn continue_with_on_cancel<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Option<&OperationError>) + 'static,
        Self: Sized;

    //--- State Predicates -------------------------------------------------

    fn is_waiting(&self) -> bool {
        self.state() == OperationState::Waiting
    }

    fn is_running(&self) -> bool {
        self.state() == OperationState::Running
    }

    fn is_cancelled(&self) -> bool {
        self.state() == OperationState::Cancelled
    }

    fn is_completed(&self) -> bool {
        self.state() == OperationState::Completed
    }

    /// True once cancelled or completed.
    fn is_ended(&self) -> bool {
        self.state().is_terminal()
    }
}

//=== Completable Trait ===================================================

/// Operations completed without a result value.
pub trait Completable: Operation {
    /// Moves a non-terminal operation to `Completed`, firing completion
    /// handlers then end handlers. No-op once terminal.
    fn complete(&self);

    /// Registers a handler fired on completion; immediate if already
    /// completed, dropped if cancelled.
    fn continue_with_on_complete<F>(&self, handler: F) -> &Self
    where
        F: FnOnce() + 'static,
        Self: Sized;

    /// Registers a handler fired on either terminal transition with
    /// `(success, error)`; immediate if already terminal.
    fn continue_with_on_end<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(bool, Option<&OperationError>) + 'static,
        Self: Sized;
}
