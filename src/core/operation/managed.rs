//=========================================================================
// Managed Operation
//=========================================================================
//
// Operation completed explicitly by whoever drives the work.
//
// Guards:
//   complete() / cancel() take effect while state <= Running, so an
//   operation that was never run can still be completed or cancelled.
//
// Firing order on each transition:
//   complete: on-complete handlers → on-end(true, None)
//   cancel:   sink → on-cancel handlers → on-end(false, error)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{
    CallbackList, Completable, CompleteHandler, EndHandler, Lifecycle, Operation,
    OperationError, OperationState,
};
use crate::builder::OperationBuilder;

//=== ManagedOperation ====================================================

struct ManagedInner {
    lifecycle: Lifecycle,
    on_complete: CallbackList<CompleteHandler>,
    on_end: CallbackList<EndHandler>,
}

/// Operation completed by an explicit call to [`Completable::complete`].
///
/// ```
/// use aetheric_operations::prelude::*;
///
/// let op = ManagedOperation::new(false);
/// op.run().continue_with_on_complete(|| println!("loaded"));
/// op.complete();
/// assert!(op.is_completed());
/// ```
#[derive(Clone)]
pub struct ManagedOperation {
    inner: Rc<RefCell<ManagedInner>>,
}

impl ManagedOperation {
    //--- Construction -----------------------------------------------------

    /// Creates an operation with default settings, optionally already running.
    pub fn new(run_on_create: bool) -> Self {
        OperationBuilder::new()
            .with_run_on_create(run_on_create)
            .managed()
    }

    pub(crate) fn from_lifecycle(lifecycle: Lifecycle) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManagedInner {
                lifecycle,
                on_complete: CallbackList::new(),
                on_end: CallbackList::new(),
            })),
        }
    }

    /// Label used in diagnostics.
    pub fn label(&self) -> String {
        self.inner.borrow().lifecycle.label().to_owned()
    }

    /// Returns true if both handles refer to the same operation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

//--- Operation -----------------------------------------------------------

impl Operation for ManagedOperation {
    fn state(&self) -> OperationState {
        self.inner.borrow().lifecycle.state()
    }

    fn error(&self) -> Option<OperationError> {
        self.inner.borrow().lifecycle.error().cloned()
    }

    fn run(&self) -> &Self {
        self.inner.borrow_mut().lifecycle.start();
        self
    }

    fn on_cancel(&self, error: Option<OperationError>) {
        let (notice, on_end) = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle.state() > OperationState::Running {
                return;
            }
            inner.on_complete.clear();
            let on_end = inner.on_end.take();
            (inner.lifecycle.mark_cancelled(error), on_end)
        };

        let error = notice.fire();
        for handler in on_end {
            handler(false, error.as_ref());
        }
    }

    fn continue_with_on_cancel<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Option<&OperationError>) + 'static,
    {
        let immediate = self.inner.borrow_mut().lifecycle.register_cancel(Box::new(handler));
        if let Some(handler) = immediate {
            let error = self.error();
            handler(error.as_ref());
        }
        self
    }
}

//--- Completable ---------------------------------------------------------

impl Completable for ManagedOperation {
    fn complete(&self) {
        let (on_complete, on_end) = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle.state() > OperationState::Running {
                return;
            }
            inner.lifecycle.mark_completed();
            (inner.on_complete.take(), inner.on_end.take())
        };

        for handler in on_complete {
            handler();
        }
        for handler in on_end {
            handler(true, None);
        }
    }

    fn continue_with_on_complete<F>(&self, handler: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        match self.state() {
            OperationState::Completed => handler(),
            OperationState::Cancelled => {
                debug!("Operation '{}' already cancelled, dropping complete handler", self.label());
            }
            _ => self.inner.borrow_mut().on_complete.push(Box::new(handler)),
        }
        self
    }

    fn continue_with_on_end<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(bool, Option<&OperationError>) + 'static,
    {
        let state = self.state();
        if state.is_terminal() {
            let error = self.error();
            handler(state == OperationState::Completed, error.as_ref());
        } else {
            self.inner.borrow_mut().on_end.push(Box::new(handler));
        }
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
