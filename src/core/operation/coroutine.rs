//=========================================================================
// Coroutine Operation
//=========================================================================
//
// Operation completed when a scheduled sequence finishes.
//
// Architecture:
//   run() ──submit──> Scheduler ── sequence        (the work)
//         ──submit──> Scheduler ── CompletionWatch (polls the work)
//
//   Each tick the watch checks `is_active(sequence)`. Once inactive:
//     fault recorded → cancel(fault)
//     otherwise      → complete()
//
// The watch is submitted after the sequence, so it observes the
// sequence finishing within the same tick.
//
// Panics raised by continuation handlers while the watch resolves the
// operation propagate out of the scheduler's tick.
//
// Cancelling a running operation terminates the watch and the sequence
// before the state changes, so neither steps again.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

//=== Internal Dependencies ===============================================

use super::{Completable, ManagedOperation, Operation, OperationError, OperationState};
use crate::builder::OperationBuilder;
use crate::core::diagnostics::NullSink;
use crate::core::scheduler::{Scheduler, Sequence, SequenceHandle, Step};

//=== CompletionWatch =====================================================

/// Sequence polling another sequence and resolving the operation once
/// it is no longer active.
struct CompletionWatch {
    target: SequenceHandle,
    scheduler: Weak<dyn Scheduler>,
    operation: ManagedOperation,
}

impl Sequence for CompletionWatch {
    fn step(&mut self) -> Step {
        let Some(scheduler) = self.scheduler.upgrade() else {
            return Step::Done;
        };

        if scheduler.is_active(self.target) {
            return Step::Yield;
        }

        match scheduler.take_fault(self.target) {
            Some(fault) => self.operation.cancel(Some(fault)),
            None => self.operation.complete(),
        }
        Step::Done
    }

    // Completion runs user handlers; their panics belong to the caller.
    fn catches_panics(&self) -> bool {
        false
    }
}

//=== CoroutineOperation ==================================================

#[derive(Default)]
struct SequenceSlots {
    pending: Option<Box<dyn Sequence>>,
    sequence: Option<SequenceHandle>,
    watch: Option<SequenceHandle>,
}

/// Operation wrapping a [`Sequence`] stepped by an external [`Scheduler`].
///
/// ```
/// use std::rc::Rc;
/// use aetheric_operations::prelude::*;
/// use aetheric_operations::core::scheduler::sequence;
///
/// let scheduler = Rc::new(TickScheduler::new());
/// let op = CoroutineOperation::new(
///     scheduler.clone(),
///     Some(Box::new(sequence::wait_ticks(2))),
///     true,
/// );
///
/// while !op.is_ended() {
///     scheduler.tick();
/// }
/// assert!(op.is_completed());
/// ```
#[derive(Clone)]
pub struct CoroutineOperation {
    managed: ManagedOperation,
    slots: Rc<RefCell<SequenceSlots>>,
    scheduler: Option<Rc<dyn Scheduler>>,
}

impl CoroutineOperation {
    //--- Construction -----------------------------------------------------

    /// Creates an operation for `sequence` on `scheduler`.
    ///
    /// A `None` sequence yields an operation that is already completed and
    /// never touches the scheduler.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        sequence: Option<Box<dyn Sequence>>,
        run_on_create: bool,
    ) -> Self {
        OperationBuilder::new()
            .with_run_on_create(run_on_create)
            .coroutine(scheduler, sequence)
    }

    /// Pre-completed operation for call sites with no work to do.
    pub fn null() -> Self {
        let managed = OperationBuilder::new()
            .with_label("null")
            .with_sink(Rc::new(NullSink))
            .managed();
        Self::from_parts(managed, None, None, false)
    }

    pub(crate) fn from_parts(
        managed: ManagedOperation,
        scheduler: Option<Rc<dyn Scheduler>>,
        sequence: Option<Box<dyn Sequence>>,
        run_on_create: bool,
    ) -> Self {
        let has_sequence = sequence.is_some();
        let operation = Self {
            managed,
            slots: Rc::new(RefCell::new(SequenceSlots {
                pending: sequence,
                ..SequenceSlots::default()
            })),
            scheduler,
        };

        if !has_sequence {
            operation.managed.complete();
        } else if run_on_create {
            operation.run();
        }
        operation
    }

    //--- Queries ----------------------------------------------------------

    pub fn label(&self) -> String {
        self.managed.label()
    }

    /// Handle of the submitted sequence, once running.
    pub fn sequence_handle(&self) -> Option<SequenceHandle> {
        self.slots.borrow().sequence
    }

    /// Handle of the polling watch, once running.
    pub fn watch_handle(&self) -> Option<SequenceHandle> {
        self.slots.borrow().watch
    }

    //--- Internal Helpers -------------------------------------------------

    /// Terminates the watch then the sequence, or drops an unsubmitted one.
    fn stop_sequences(&self) {
        let (pending, watch, sequence) = {
            let mut slots = self.slots.borrow_mut();
            (slots.pending.take(), slots.watch, slots.sequence)
        };
        drop(pending);

        if let Some(scheduler) = &self.scheduler {
            if let Some(handle) = watch {
                scheduler.terminate(handle);
            }
            if let Some(handle) = sequence {
                scheduler.terminate(handle);
            }
        }
    }
}

//--- Operation -----------------------------------------------------------

impl Operation for CoroutineOperation {
    fn state(&self) -> OperationState {
        self.managed.state()
    }

    fn error(&self) -> Option<OperationError> {
        self.managed.error()
    }

    fn run(&self) -> &Self {
        if !self.managed.is_waiting() {
            return self;
        }
        let Some(scheduler) = &self.scheduler else {
            return self;
        };
        let Some(sequence) = self.slots.borrow_mut().pending.take() else {
            return self;
        };

        self.managed.run();

        let sequence_handle = scheduler.submit(sequence);
        let watch = CompletionWatch {
            target: sequence_handle,
            scheduler: Rc::downgrade(scheduler),
            operation: self.managed.clone(),
        };
        let watch_handle = scheduler.submit(Box::new(watch));

        debug!(
            "Operation '{}' scheduled {} (watch {})",
            self.managed.label(),
            sequence_handle,
            watch_handle
        );

        let mut slots = self.slots.borrow_mut();
        slots.sequence = Some(sequence_handle);
        slots.watch = Some(watch_handle);
        self
    }

    fn on_cancel(&self, error: Option<OperationError>) {
        if self.managed.is_ended() {
            return;
        }
        self.stop_sequences();
        self.managed.on_cancel(error);
    }

    fn continue_with_on_cancel<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(Option<&OperationError>) + 'static,
    {
        self.managed.continue_with_on_cancel(handler);
        self
    }
}

//--- Completable ---------------------------------------------------------

impl Completable for CoroutineOperation {
    /// Completes early; a still-running sequence is terminated first.
    fn complete(&self) {
        if self.managed.is_ended() {
            return;
        }
        self.stop_sequences();
        self.managed.complete();
    }

    fn continue_with_on_complete<F>(&self, handler: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        self.managed.continue_with_on_complete(handler);
        self
    }

    fn continue_with_on_end<F>(&self, handler: F) -> &Self
    where
        F: FnOnce(bool, Option<&OperationError>) + 'static,
    {
        self.managed.continue_with_on_end(handler);
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
