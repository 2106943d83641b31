//=========================================================================
// Tick Scheduler
//=========================================================================
//
// Deterministic cooperative scheduler advanced by explicit `tick()` calls.
//
// Architecture:
//   submit() → queue ──tick()──> step each live sequence once
//                                  ├─ Yield → back into queue
//                                  ├─ Done  → retired
//                                  └─ Fault → retired, fault recorded
//
// Rules:
// - Sequences submitted during a tick first run on the following tick.
// - Sequences run in submission order within a tick.
// - A sequence terminated mid-tick is not stepped again, even later in
//   the same tick.
// - A panic inside a step is caught and recorded as a fault, unless the
//   sequence opts out via `catches_panics`.
// - An unclaimed fault is kept until the end of the tick after the one
//   that recorded it.
//
// No internal borrow is held while a sequence steps, so steps may call
// back into the scheduler.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::{Scheduler, Sequence, SequenceHandle, Step};
use crate::core::operation::OperationError;

//=== TickScheduler =======================================================

struct Entry {
    handle: SequenceHandle,
    sequence: Box<dyn Sequence>,
}

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    ticks: u64,
    queue: Vec<Entry>,
    live: HashSet<SequenceHandle>,
    // Tick each fault was recorded in.
    faults: HashMap<SequenceHandle, (u64, OperationError)>,
}

/// Single-threaded scheduler stepping every live sequence once per tick.
///
/// ```
/// use aetheric_operations::prelude::*;
/// use aetheric_operations::core::scheduler::sequence;
///
/// let scheduler = TickScheduler::new();
/// let handle = scheduler.submit(Box::new(sequence::wait_ticks(1)));
///
/// scheduler.tick(); // yields
/// assert!(scheduler.is_active(handle));
/// scheduler.tick(); // finishes
/// assert!(!scheduler.is_active(handle));
/// ```
#[derive(Default)]
pub struct TickScheduler {
    state: RefCell<SchedulerState>,
}

impl TickScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Update Loop ------------------------------------------------------

    /// Steps every live sequence once. Returns the number of steps taken.
    ///
    /// # Panics
    ///
    /// Propagates a panic raised by a sequence whose
    /// [`catches_panics`](Sequence::catches_panics) is `false`. That
    /// sequence is retired and the rest of the batch stays queued.
    pub fn tick(&self) -> usize {
        let entries = {
            let mut state = self.state.borrow_mut();
            state.ticks += 1;
            let now = state.ticks;
            state.faults.retain(|_, (recorded, _)| *recorded + 1 >= now);
            std::mem::take(&mut state.queue)
        };

        let mut batch = TickBatch {
            scheduler: self,
            survivors: Vec::with_capacity(entries.len()),
            pending: entries.into_iter(),
            stepping: None,
        };
        let mut stepped = 0;

        while let Some(mut entry) = batch.pending.next() {
            if !self.is_active(entry.handle) {
                continue;
            }

            stepped += 1;
            batch.stepping = Some(entry.handle);
            let step = if entry.sequence.catches_panics() {
                panic::catch_unwind(AssertUnwindSafe(|| entry.sequence.step()))
                    .unwrap_or_else(|payload| Step::Fault(OperationError::error(panic_message(payload))))
            } else {
                entry.sequence.step()
            };
            batch.stepping = None;

            match step {
                Step::Yield => {
                    if self.is_active(entry.handle) {
                        batch.survivors.push(entry);
                    }
                }
                Step::Done => self.retire(entry.handle, None),
                Step::Fault(err) => {
                    warn!("Sequence {} faulted: {}", entry.handle, err);
                    self.retire(entry.handle, Some(err));
                }
            }
        }
        drop(batch);

        let state = self.state.borrow();
        trace!("Tick {}: {} steps, {} live", state.ticks, stepped, state.live.len());
        stepped
    }

    //--- Queries ----------------------------------------------------------

    /// Number of sequences that have neither finished nor been terminated.
    pub fn active_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// True when no sequence is live.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().live.is_empty()
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.state.borrow().ticks
    }

    /// Number of sequences ever submitted.
    pub fn submitted_count(&self) -> u64 {
        self.state.borrow().next_id
    }

    //--- Internal Helpers -------------------------------------------------

    fn retire(&self, handle: SequenceHandle, fault: Option<OperationError>) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&handle);
        if let Some(err) = fault {
            let now = state.ticks;
            state.faults.insert(handle, (now, err));
        }
    }
}

//--- TickBatch -----------------------------------------------------------

/// Entries taken out of the queue for one tick.
///
/// Dropping the batch, on return or while unwinding, puts every entry
/// still live back in front of the sequences submitted during the tick.
struct TickBatch<'a> {
    scheduler: &'a TickScheduler,
    pending: std::vec::IntoIter<Entry>,
    survivors: Vec<Entry>,
    stepping: Option<SequenceHandle>,
}

impl Drop for TickBatch<'_> {
    fn drop(&mut self) {
        // Only set while unwinding out of an uncaught step.
        if let Some(handle) = self.stepping.take() {
            warn!("Sequence {} panicked; retired without a fault", handle);
            self.scheduler.retire(handle, None);
        }

        let mut kept = std::mem::take(&mut self.survivors);
        kept.extend(self.pending.by_ref());
        kept.retain(|entry| self.scheduler.is_active(entry.handle));

        let mut state = self.scheduler.state.borrow_mut();
        let submitted = std::mem::replace(&mut state.queue, kept);
        state.queue.extend(submitted);
    }
}

//--- Scheduler -----------------------------------------------------------

impl Scheduler for TickScheduler {
    fn submit(&self, sequence: Box<dyn Sequence>) -> SequenceHandle {
        let mut state = self.state.borrow_mut();
        let handle = SequenceHandle::new(state.next_id);
        state.next_id += 1;
        state.live.insert(handle);
        state.queue.push(Entry { handle, sequence });
        trace!("Submitted {}", handle);
        handle
    }

    fn is_active(&self, handle: SequenceHandle) -> bool {
        self.state.borrow().live.contains(&handle)
    }

    fn terminate(&self, handle: SequenceHandle) {
        // Dropped after the borrow ends; a sequence's destructor may
        // call back into the scheduler.
        let removed = {
            let mut state = self.state.borrow_mut();
            state.faults.remove(&handle);
            if !state.live.remove(&handle) {
                return;
            }
            let position = state.queue.iter().position(|e| e.handle == handle);
            position.map(|pos| state.queue.remove(pos))
        };
        trace!("Terminated {}", handle);
        drop(removed);
    }

    fn take_fault(&self, handle: SequenceHandle) -> Option<OperationError> {
        self.state.borrow_mut().faults.remove(&handle).map(|(_, err)| err)
    }
}

//=== Helpers =============================================================

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("sequence panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("sequence panicked: {}", msg)
    } else {
        String::from("sequence panicked")
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::sequence::{from_fn, wait_ticks};
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter(count: &Rc<Cell<u32>>) -> Box<dyn Sequence> {
        let count = Rc::clone(count);
        Box::new(from_fn(move || {
            count.set(count.get() + 1);
            Step::Yield
        }))
    }

    //=====================================================================
    // Stepping Tests
    //=====================================================================

    #[test]
    fn new_scheduler_is_idle() {
        let scheduler = TickScheduler::new();
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(scheduler.tick_count(), 1);
    }

    #[test]
    fn sequence_steps_once_per_tick() {
        let scheduler = TickScheduler::new();
        let count = Rc::new(Cell::new(0));
        scheduler.submit(counter(&count));

        assert_eq!(count.get(), 0);
        scheduler.tick();
        scheduler.tick();
        scheduler.tick();

        assert_eq!(count.get(), 3);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn finished_sequence_becomes_inactive() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(wait_ticks(2)));

        scheduler.tick();
        scheduler.tick();
        assert!(scheduler.is_active(handle));

        scheduler.tick();
        assert!(!scheduler.is_active(handle));
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.take_fault(handle), None);
    }

    #[test]
    fn sequences_run_in_submission_order() {
        let scheduler = TickScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in 0..3 {
            let order = Rc::clone(&order);
            scheduler.submit(Box::new(from_fn(move || {
                order.borrow_mut().push(tag);
                Step::Done
            })));
        }

        assert_eq!(scheduler.tick(), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    //=====================================================================
    // Re-entrancy Tests
    //=====================================================================

    #[test]
    fn submit_during_tick_runs_next_tick() {
        let scheduler = Rc::new(TickScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_scheduler = Rc::clone(&scheduler);
        let inner_count = Rc::clone(&count);
        scheduler.submit(Box::new(from_fn(move || {
            inner_scheduler.submit(counter(&inner_count));
            Step::Done
        })));

        scheduler.tick();
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.active_count(), 1);

        scheduler.tick();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn terminate_during_tick_skips_later_sequence() {
        let scheduler = Rc::new(TickScheduler::new());
        let count = Rc::new(Cell::new(0));

        let victim = Rc::new(Cell::new(None));
        let killer_scheduler = Rc::clone(&scheduler);
        let killer_victim = Rc::clone(&victim);
        scheduler.submit(Box::new(from_fn(move || {
            if let Some(handle) = killer_victim.get() {
                killer_scheduler.terminate(handle);
            }
            Step::Done
        })));
        victim.set(Some(scheduler.submit(counter(&count))));

        scheduler.tick();

        assert_eq!(count.get(), 0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn sequence_can_terminate_itself() {
        let scheduler = Rc::new(TickScheduler::new());
        let own = Rc::new(Cell::new(None));

        let inner_scheduler = Rc::clone(&scheduler);
        let inner_own = Rc::clone(&own);
        let handle = scheduler.submit(Box::new(from_fn(move || {
            if let Some(handle) = inner_own.get() {
                inner_scheduler.terminate(handle);
            }
            Step::Yield
        })));
        own.set(Some(handle));

        scheduler.tick();

        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.tick(), 0);
    }

    //=====================================================================
    // Termination & Fault Tests
    //=====================================================================

    #[test]
    fn terminate_stops_stepping() {
        let scheduler = TickScheduler::new();
        let count = Rc::new(Cell::new(0));
        let handle = scheduler.submit(counter(&count));

        scheduler.tick();
        scheduler.terminate(handle);
        scheduler.tick();

        assert_eq!(count.get(), 1);
        assert!(!scheduler.is_active(handle));
    }

    #[test]
    fn terminate_unknown_handle_is_ignored() {
        let scheduler = TickScheduler::new();
        scheduler.terminate(SequenceHandle::new(99));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn fault_is_recorded_once() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(from_fn(|| {
            Step::Fault(OperationError::error("bad data"))
        })));

        scheduler.tick();

        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.take_fault(handle), Some(OperationError::error("bad data")));
        assert_eq!(scheduler.take_fault(handle), None);
    }

    #[test]
    fn panic_is_caught_as_fault() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(from_fn(|| -> Step { panic!("exploded") })));

        scheduler.tick();

        let fault = scheduler.take_fault(handle).unwrap();
        assert_eq!(fault.message(), "sequence panicked: exploded");
        assert!(scheduler.is_idle());
    }

    #[test]
    fn unclaimed_fault_expires_after_following_tick() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(from_fn(|| {
            Step::Fault(OperationError::warning("stale"))
        })));
        let kept = scheduler.submit(Box::new(from_fn(|| {
            Step::Fault(OperationError::warning("claimed late"))
        })));

        scheduler.tick();
        scheduler.tick();
        assert_eq!(scheduler.take_fault(kept), Some(OperationError::warning("claimed late")));

        scheduler.tick();
        assert_eq!(scheduler.take_fault(handle), None);
        assert!(scheduler.state.borrow().faults.is_empty());
    }

    #[test]
    fn terminate_clears_fault_of_retired_sequence() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(from_fn(|| {
            Step::Fault(OperationError::error("disk full"))
        })));

        scheduler.tick();
        assert!(!scheduler.is_active(handle));

        scheduler.terminate(handle);
        assert_eq!(scheduler.take_fault(handle), None);
    }

    //=====================================================================
    // Uncaught Panic Tests
    //=====================================================================

    struct Uncaught;

    impl Sequence for Uncaught {
        fn step(&mut self) -> Step {
            panic!("handler bug")
        }

        fn catches_panics(&self) -> bool {
            false
        }
    }

    #[test]
    fn uncaught_panic_propagates_out_of_tick() {
        let scheduler = TickScheduler::new();
        let handle = scheduler.submit(Box::new(Uncaught));

        let result = panic::catch_unwind(AssertUnwindSafe(|| scheduler.tick()));

        assert!(result.is_err());
        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.take_fault(handle), None);
    }

    #[test]
    fn uncaught_panic_keeps_rest_of_batch_queued() {
        let scheduler = TickScheduler::new();
        let before = Rc::new(Cell::new(0));
        let after = Rc::new(Cell::new(0));
        scheduler.submit(counter(&before));
        scheduler.submit(Box::new(Uncaught));
        scheduler.submit(counter(&after));

        let result = panic::catch_unwind(AssertUnwindSafe(|| scheduler.tick()));
        assert!(result.is_err());
        assert_eq!((before.get(), after.get()), (1, 0));
        assert_eq!(scheduler.active_count(), 2);

        assert_eq!(scheduler.tick(), 2);
        assert_eq!((before.get(), after.get()), (2, 1));
    }
}
