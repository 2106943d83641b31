//=========================================================================
// Managed Return Operation
//=========================================================================
//
// Operation completed with a typed result.
//
// Guards differ from ManagedOperation: complete(result) and cancel()
// only take effect while exactly Running. An operation that was never
// run rejects both silently (no transition, no handlers).
//
// The result is held behind an `Rc` so handlers can borrow it after the
// operation's own borrow has been released.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{CallbackList, Lifecycle, Operation, OperationError, OperationState};
use crate::builder::OperationBuilder;

//=== Handler Types =======================================================

/// Handler fired with the result on completion.
pub type ResultHandler<T> = dyn FnOnce(&T);

/// Handler fired on either terminal transition with `(success, error, result)`.
pub type ResultEndHandler<T> = dyn FnOnce(bool, Option<&OperationError>, Option<&T>);

//=== ManagedReturnOperation ==============================================

struct ReturnInner<T> {
    lifecycle: Lifecycle,
    result: Option<Rc<T>>,
    on_complete: CallbackList<ResultHandler<T>>,
    on_end: CallbackList<ResultEndHandler<T>>,
}

/// Operation that completes with a value of type `T`.
///
/// ```
/// use aetheric_operations::prelude::*;
///
/// let op = ManagedReturnOperation::<i32>::new(false);
/// op.run();
/// op.continue_with_on_complete(|value| assert_eq!(*value, 42));
/// op.complete(42);
/// assert_eq!(op.result(), Some(42));
/// ```
pub struct ManagedReturnOperation<T> {
    inner: Rc<RefCell<ReturnInner<T>>>,
}

impl<T> Clone for ManagedReturnOperation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> ManagedReturnOperation<T> {
    //--- Construction -----------------------------------------------------

    /// Creates an operation with default settings, optionally already running.
    pub fn new(run_on_create: bool) -> Self {
        OperationBuilder::new()
            .with_run_on_create(run_on_create)
            .returning()
    }

    pub(crate) fn from_lifecycle(lifecycle: Lifecycle) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ReturnInner {
                lifecycle,
                result: None,
                on_complete: CallbackList::new(),
                on_end: CallbackList::new(),
            })),
        }
    }

    pub fn label(&self) -> String {
        self.inner.borrow().lifecycle.label().to_owned()
    }

    //--- Result -----------------------------------------------------------

    /// Shared handle to the result; `None` until completed.
    pub fn shared_result(&self) -> Option<Rc<T>> {
        self.inner.borrow().result.clone()
    }

    //--- Completion -------------------------------------------------------

    /// Stores `result` and completes. Only valid while running.
    pub fn complete(&self, result: T) {
        let (result, on_complete, on_end) = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle.state() != OperationState::Running {
                debug!(
                    "Operation '{}' is {}, ignoring complete",
                    inner.lifecycle.label(),
                    inner.lifecycle.state()
                );
                return;
            }
            let result = Rc::new(result);
            inner.result = Some(Rc::clone(&result));
            inner.lifecycle.mark_completed();
            (result, inner.on_complete.take(), inner.on_end.take())
        };

        for handler in on_complete {
            handler(result.as_ref());
        }
        for handler in on_end {
            handler(true, None, Some(result.as_ref()));
        }
    }

    /// Registers a handler fired with the result; immediate if already
    /// completed, dropped if cancelled.
    pub fn continue_with_on_complete<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(&T) + 'static,
    {
        match self.state() {
            OperationState::Completed => {
                if let Some(result) = self.shared_result() {
                    handler(result.as_ref());
                }
            }
            OperationState::Cancelled => {
                debug!("Operation '{}' already cancelled, dropping complete handler", self.label());
            }
            _ => self.inner.borrow_mut().on_complete.push(Box::new(handler)),
        }
        self
    }

    /// Registers a handler fired on either terminal transition with
    /// `(success, error, result)`; immediate if already terminal.
    pub fn continue_with_on_end<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(bool, Option<&OperationError>, Option<&T>) + 'static,
    {
        let state = self.state();
        if state.is_terminal() {
            let error = self.error();
            let result = self.shared_result();
            handler(
                state == OperationState::Completed,
                error.as_ref(),
                result.as_deref(),
            );
        } else {
            self.inner.borrow_mut().on_end.push(Box::new(handler));
        }
        self
    }
}

impl<T: Clone + 'static> ManagedReturnOperation<T> {
    /// Copy of the result; `None` until completed.
    pub fn result(&self) -> Option<T> {
        self.inner.borrow().result.as_deref().cloned()
    }
}

//--- Operation -----------------------------------------------------------

impl<T: 'static> Operation for ManagedReturnOperation<T> {
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
            if inner.lifecycle.state() != OperationState::Running {
                debug!(
                    "Operation '{}' is {}, ignoring cancel",
                    inner.lifecycle.label(),
                    inner.lifecycle.state()
                );
                return;
            }
            inner.on_complete.clear();
            let on_end = inner.on_end.take();
            (inner.lifecycle.mark_cancelled(error), on_end)
        };

        let error = notice.fire();
        for handler in on_end {
            handler(false, error.as_ref(), None);
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

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operation::{Completable, ManagedOperation};
    use std::cell::Cell;

    //=====================================================================
    // Completion Tests
    //=====================================================================

    #[test]
    fn complete_delivers_result_to_handlers() {
        let op = ManagedReturnOperation::<i32>::new(false);
        op.run();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        op.continue_with_on_complete(move |value| s.borrow_mut().push(format!("complete {}", value)));
        let s = Rc::clone(&seen);
        op.continue_with_on_end(move |ok, err, value| {
            s.borrow_mut().push(format!("end {} {:?} {:?}", ok, err, value))
        });

        op.complete(42);

        assert_eq!(*seen.borrow(), vec!["complete 42", "end true None Some(42)"]);
        assert_eq!(op.result(), Some(42));
        assert!(op.is_completed());
    }

    #[test]
    fn late_handlers_receive_same_result() {
        let op = ManagedReturnOperation::<String>::new(true);
        op.complete("ready".to_owned());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        op.continue_with_on_complete(move |value| s.borrow_mut().push(value.clone()));
        let s = Rc::clone(&seen);
        op.continue_with_on_end(move |ok, _, value| {
            assert!(ok);
            s.borrow_mut().push(value.unwrap().clone());
        });

        assert_eq!(*seen.borrow(), vec!["ready", "ready"]);
    }

    #[test]
    fn second_complete_is_ignored() {
        let op = ManagedReturnOperation::<u32>::new(true);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        op.continue_with_on_complete(move |_| c.set(c.get() + 1));

        op.complete(1);
        op.complete(2);

        assert_eq!(op.result(), Some(1));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn shared_result_is_the_stored_value() {
        let op = ManagedReturnOperation::<Vec<u8>>::new(true);
        assert!(op.shared_result().is_none());
        op.complete(vec![1, 2, 3]);
        assert_eq!(op.shared_result().as_deref(), Some(&vec![1, 2, 3]));
    }

    //=====================================================================
    // Waiting Guard Tests
    //=====================================================================

    #[test]
    fn complete_while_waiting_is_rejected() {
        let op = ManagedReturnOperation::<i32>::new(false);
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        op.continue_with_on_end(move |_, _, _| f.set(true));

        op.complete(7);

        assert!(op.is_waiting());
        assert_eq!(op.result(), None);
        assert!(!fired.get());
    }

    #[test]
    fn cancel_while_waiting_is_rejected() {
        let op = ManagedReturnOperation::<i32>::new(false);
        op.cancel(Some(OperationError::error("too early")));

        assert!(op.is_waiting());
        assert_eq!(op.error(), None);

        // Still usable afterwards.
        op.run();
        op.complete(3);
        assert_eq!(op.result(), Some(3));
    }

    #[test]
    fn managed_operation_accepts_waiting_complete_unlike_return_variant() {
        let managed = ManagedOperation::new(false);
        let returning = ManagedReturnOperation::<()>::new(false);

        managed.complete();
        returning.complete(());

        assert!(managed.is_completed());
        assert!(returning.is_waiting());
    }

    //=====================================================================
    // Cancellation Tests
    //=====================================================================

    #[test]
    fn cancel_fires_cancel_then_end_without_result() {
        let op = ManagedReturnOperation::<i32>::new(true);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        op.continue_with_on_end(move |ok, err, value| {
            s.borrow_mut().push(format!("end {} {} {:?}", ok, err.unwrap().message(), value))
        });
        let s = Rc::clone(&seen);
        op.continue_with_on_cancel(move |err| {
            s.borrow_mut().push(format!("cancel {}", err.unwrap().message()))
        });
        let s = Rc::clone(&seen);
        op.continue_with_on_complete(move |_| s.borrow_mut().push("complete".to_owned()));

        op.cancel(Some(OperationError::warning("superseded")));

        assert_eq!(*seen.borrow(), vec!["cancel superseded", "end false superseded None"]);
        assert_eq!(op.result(), None);
        assert!(op.is_cancelled());
    }

    #[test]
    fn complete_after_cancel_is_ignored() {
        let op = ManagedReturnOperation::<i32>::new(true);
        op.cancel(None);
        op.complete(5);

        assert!(op.is_cancelled());
        assert_eq!(op.result(), None);
    }

    #[test]
    fn cancel_after_complete_is_ignored() {
        let op = ManagedReturnOperation::<i32>::new(true);
        let cancels = Rc::new(Cell::new(0));
        let ends = Rc::new(RefCell::new(Vec::new()));

        let c = Rc::clone(&cancels);
        op.continue_with_on_cancel(move |_| c.set(c.get() + 1));
        let e = Rc::clone(&ends);
        op.continue_with_on_end(move |ok, _, value| e.borrow_mut().push((ok, value.copied())));

        op.complete(7);
        op.cancel(Some(OperationError::error("too late")));
        op.run();

        assert!(op.is_completed());
        assert_eq!(op.error(), None);
        assert_eq!(op.result(), Some(7));
        assert_eq!(cancels.get(), 0);
        assert_eq!(*ends.borrow(), vec![(true, Some(7))]);
    }

    #[test]
    fn run_on_cancelled_return_operation_is_ignored() {
        let op = ManagedReturnOperation::<i32>::new(true);
        op.cancel(None);
        op.run();

        assert!(op.is_cancelled());
    }

    #[test]
    fn late_end_after_cancel_has_no_result() {
        let op = ManagedReturnOperation::<i32>::new(true);
        op.cancel(Some(OperationError::error("gone")));

        let seen = Rc::new(Cell::new(false));
        let s = Rc::clone(&seen);
        op.continue_with_on_end(move |ok, err, value| {
            assert!(!ok);
            assert_eq!(err.unwrap().message(), "gone");
            assert!(value.is_none());
            s.set(true);
        });

        assert!(seen.get());
    }
}
