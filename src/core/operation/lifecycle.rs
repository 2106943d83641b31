//=========================================================================
// Lifecycle
//=========================================================================
//
// State, error and cancellation handlers shared by every operation
// variant. Each variant embeds one `Lifecycle` and layers its own
// completion handlers on top.
//
// Transition helpers only mutate; firing happens in `CancelNotice::fire`
// once the owning variant has released its borrow.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::{CallbackList, CancelHandler, OperationError, OperationState};
use crate::core::diagnostics::DiagnosticSink;

//=== Lifecycle ===========================================================

pub(crate) struct Lifecycle {
    state: OperationState,
    error: Option<OperationError>,
    label: String,
    sink: Rc<dyn DiagnosticSink>,
    on_cancel: CallbackList<CancelHandler>,
}

impl Lifecycle {
    pub(crate) fn new(label: String, sink: Rc<dyn DiagnosticSink>, run_on_create: bool) -> Self {
        let state = if run_on_create {
            OperationState::Running
        } else {
            OperationState::Waiting
        };
        trace!("Operation '{}' created ({})", label, state);

        Self {
            state,
            error: None,
            label,
            sink,
            on_cancel: CallbackList::new(),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub(crate) fn state(&self) -> OperationState {
        self.state
    }

    pub(crate) fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    //--- Transitions ------------------------------------------------------

    /// `Waiting → Running`. Returns false if the operation had already started.
    pub(crate) fn start(&mut self) -> bool {
        if self.state != OperationState::Waiting {
            return false;
        }
        self.state = OperationState::Running;
        trace!("Operation '{}' running", self.label);
        true
    }

    /// Moves to `Completed`. Pending cancellation handlers can never fire
    /// and are dropped.
    pub(crate) fn mark_completed(&mut self) {
        self.state = OperationState::Completed;
        self.on_cancel.clear();
        debug!("Operation '{}' completed", self.label);
    }

    /// Stores the error, moves to `Cancelled` and hands back everything
    /// needed to notify observers.
    pub(crate) fn mark_cancelled(&mut self, error: Option<OperationError>) -> CancelNotice {
        self.error = error;
        self.state = OperationState::Cancelled;
        debug!("Operation '{}' cancelled", self.label);

        CancelNotice {
            error: self.error.clone(),
            label: self.label.clone(),
            sink: Rc::clone(&self.sink),
            handlers: self.on_cancel.take(),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Queues a cancellation handler, or hands it back when it must fire
    /// right away because the operation is already cancelled.
    pub(crate) fn register_cancel(
        &mut self,
        handler: Box<CancelHandler>,
    ) -> Option<Box<CancelHandler>> {
        match self.state {
            OperationState::Cancelled => Some(handler),
            OperationState::Completed => {
                debug!("Operation '{}' already completed, dropping cancel handler", self.label);
                None
            }
            _ => {
                self.on_cancel.push(handler);
                None
            }
        }
    }
}

//=== CancelNotice ========================================================

/// Pending side effects of a cancellation, fired outside any borrow.
pub(crate) struct CancelNotice {
    error: Option<OperationError>,
    label: String,
    sink: Rc<dyn DiagnosticSink>,
    handlers: Vec<Box<CancelHandler>>,
}

impl CancelNotice {
    /// Reports the error to the sink, fires cancellation handlers in
    /// registration order and returns the error for end handlers.
    pub(crate) fn fire(self) -> Option<OperationError> {
        if let Some(err) = &self.error {
            self.sink.report(&self.label, err);
        }
        for handler in self.handlers {
            handler(self.error.as_ref());
        }
        self.error
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::ChannelSink;
    use crossbeam_channel::unbounded;
    use std::cell::RefCell;

    fn lifecycle(run_on_create: bool) -> Lifecycle {
        Lifecycle::new("test".to_owned(), Rc::new(crate::core::diagnostics::NullSink), run_on_create)
    }

    #[test]
    fn run_on_create_starts_running() {
        assert_eq!(lifecycle(true).state(), OperationState::Running);
        assert_eq!(lifecycle(false).state(), OperationState::Waiting);
    }

    #[test]
    fn start_only_from_waiting() {
        let mut lc = lifecycle(false);
        assert!(lc.start());
        assert!(!lc.start());
        assert_eq!(lc.state(), OperationState::Running);
    }

    #[test]
    fn register_cancel_after_cancel_hands_back() {
        let mut lc = lifecycle(true);
        lc.mark_cancelled(None).fire();

        let handler: Box<CancelHandler> = Box::new(|_| {});
        assert!(lc.register_cancel(handler).is_some());
    }

    #[test]
    fn register_cancel_after_complete_drops() {
        let mut lc = lifecycle(true);
        lc.mark_completed();

        let handler: Box<CancelHandler> = Box::new(|_| panic!("must not fire"));
        assert!(lc.register_cancel(handler).is_none());
    }

    #[test]
    fn notice_reports_then_fires_in_order() {
        let (tx, rx) = unbounded();
        let mut lc = Lifecycle::new("job".to_owned(), Rc::new(ChannelSink::new(tx)), true);
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in 0..2 {
            let order = Rc::clone(&order);
            let handler: Box<CancelHandler> = Box::new(move |err| {
                order.borrow_mut().push((tag, err.map(|e| e.message().to_owned())));
            });
            assert!(lc.register_cancel(handler).is_none());
        }

        let returned = lc.mark_cancelled(Some(OperationError::error("boom"))).fire();

        assert_eq!(returned, Some(OperationError::error("boom")));
        assert_eq!(rx.try_recv().unwrap().label, "job");
        assert_eq!(
            *order.borrow(),
            vec![(0, Some("boom".to_owned())), (1, Some("boom".to_owned()))]
        );
        assert_eq!(lc.error(), Some(&OperationError::error("boom")));
    }

    #[test]
    fn notice_without_error_skips_sink() {
        let (tx, rx) = unbounded();
        let mut lc = Lifecycle::new("quiet".to_owned(), Rc::new(ChannelSink::new(tx)), true);

        lc.mark_cancelled(None).fire();

        assert!(rx.try_recv().is_err());
    }
}
