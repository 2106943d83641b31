//=========================================================================
// Scheduler Contract
//=========================================================================
//
// Boundary between operations and whatever steps suspendable sequences.
//
// Architecture:
//   CoroutineOperation ──submit()────> Scheduler ──step()──> Sequence
//                      ──is_active()─>    │
//                      ──terminate()─>    │   one step per tick
//                      ──take_fault()─>   │
//
// The operation framework depends only on the `Scheduler` trait.
// `TickScheduler` is a deterministic, manually ticked implementation
// and `TickDriver` runs one at a fixed rate.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod sequence;
mod tick_driver;
mod tick_scheduler;

//=== Public API ==========================================================

pub use tick_driver::{DriverExit, TickDriver};
pub use tick_scheduler::TickScheduler;

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::operation::OperationError;

//=== Step ================================================================

/// Outcome of advancing a sequence by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Suspend until the next tick.
    Yield,

    /// The sequence has finished.
    Done,

    /// The sequence failed and will not be stepped again.
    Fault(OperationError),
}

//=== Sequence Trait ======================================================

/// A suspendable computation advanced one step per scheduler tick.
///
/// See [`sequence`] for ready-made sequences built from closures,
/// iterators, delays and tweens.
pub trait Sequence {
    fn step(&mut self) -> Step;

    /// Whether a scheduler should turn a panic inside [`step`](Self::step)
    /// into a fault. Sequences returning `false` let the panic propagate
    /// out of the scheduler.
    fn catches_panics(&self) -> bool {
        true
    }
}

impl<S: Sequence + ?Sized> Sequence for Box<S> {
    fn step(&mut self) -> Step {
        (**self).step()
    }

    fn catches_panics(&self) -> bool {
        (**self).catches_panics()
    }
}

//=== SequenceHandle ======================================================

/// Identifies a submitted sequence for later queries and termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceHandle(u64);

impl SequenceHandle {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq#{}", self.0)
    }
}

//=== Scheduler Trait =====================================================

/// Cooperative scheduler stepping submitted sequences once per tick.
///
/// All methods take `&self` and may be called from inside a running
/// sequence step, so implementations use interior mutability and must
/// not hold internal borrows while stepping.
pub trait Scheduler {
    /// Starts stepping `sequence`, beginning with the next tick.
    fn submit(&self, sequence: Box<dyn Sequence>) -> SequenceHandle;

    /// True while the sequence has neither finished nor been terminated.
    fn is_active(&self, handle: SequenceHandle) -> bool;

    /// Stops a sequence before it finishes. Unknown or finished handles
    /// are ignored.
    fn terminate(&self, handle: SequenceHandle);

    /// Takes the fault recorded for a sequence that ended with one.
    fn take_fault(&self, _handle: SequenceHandle) -> Option<OperationError> {
        None
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
