//=========================================================================
// Sequences
//=========================================================================
//
// Ready-made `Sequence` implementations.
//
//   from_fn(f)          each step calls f
//   from_iter(iter)     each step pulls one item; exhaustion finishes
//   wait_ticks(n)       yields n times, then finishes
//   tween(n, e, set)    feeds eased progress to `set` over n ticks
//   chain(a, b)         runs a to completion, then b
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{Sequence, Step};
use crate::core::easing::Easing;

//=== FromFn ==============================================================

/// Sequence driven by a closure returning the next [`Step`].
pub struct FromFn<F> {
    f: F,
}

/// Builds a sequence that calls `f` once per tick.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut() -> Step,
{
    FromFn { f }
}

impl<F: FnMut() -> Step> Sequence for FromFn<F> {
    fn step(&mut self) -> Step {
        (self.f)()
    }
}

//=== FromIter ============================================================

/// Sequence advancing an iterator by one item per tick.
pub struct FromIter<I> {
    iter: I,
}

/// Builds a sequence pulling one item from `iter` per tick.
///
/// Item values are discarded; the work lives in the iterator itself.
/// The sequence finishes on the first tick the iterator is exhausted.
pub fn from_iter<I: IntoIterator>(iter: I) -> FromIter<I::IntoIter> {
    FromIter {
        iter: iter.into_iter(),
    }
}

impl<I: Iterator> Sequence for FromIter<I> {
    fn step(&mut self) -> Step {
        match self.iter.next() {
            Some(_) => Step::Yield,
            None => Step::Done,
        }
    }
}

//=== WaitTicks ===========================================================

/// Sequence that yields a fixed number of times.
pub struct WaitTicks {
    remaining: u32,
}

/// Builds a sequence that stays active for `ticks` ticks.
pub fn wait_ticks(ticks: u32) -> WaitTicks {
    WaitTicks { remaining: ticks }
}

impl Sequence for WaitTicks {
    fn step(&mut self) -> Step {
        if self.remaining == 0 {
            return Step::Done;
        }
        self.remaining -= 1;
        Step::Yield
    }
}

//=== Tween ===============================================================

/// Sequence reporting eased progress in `(0, 1]` once per tick.
pub struct Tween<F> {
    duration: u32,
    elapsed: u32,
    easing: Easing,
    apply: F,
}

/// Builds a tween lasting `ticks` ticks.
///
/// Tick `k` (1-based) calls `apply(easing.apply(k / ticks))`; the last
/// tick always reports `1.0`. A zero-length tween reports `1.0` once.
pub fn tween<F>(ticks: u32, easing: Easing, apply: F) -> Tween<F>
where
    F: FnMut(f32),
{
    Tween {
        duration: ticks,
        elapsed: 0,
        easing,
        apply,
    }
}

impl<F: FnMut(f32)> Sequence for Tween<F> {
    fn step(&mut self) -> Step {
        if self.duration == 0 {
            (self.apply)(1.0);
            return Step::Done;
        }

        self.elapsed += 1;
        let t = self.elapsed as f32 / self.duration as f32;
        (self.apply)(self.easing.apply(t));

        if self.elapsed >= self.duration {
            Step::Done
        } else {
            Step::Yield
        }
    }
}

//=== Chain ===============================================================

/// Two sequences run back to back.
pub struct Chain<A, B> {
    first: Option<A>,
    second: B,
}

/// Runs `first` to completion, then `second` starting on the next tick.
///
/// A fault in `first` ends the chain with that fault.
pub fn chain<A: Sequence, B: Sequence>(first: A, second: B) -> Chain<A, B> {
    Chain {
        first: Some(first),
        second,
    }
}

impl<A: Sequence, B: Sequence> Sequence for Chain<A, B> {
    fn step(&mut self) -> Step {
        if let Some(first) = self.first.as_mut() {
            return match first.step() {
                Step::Done => {
                    self.first = None;
                    Step::Yield
                }
                other => other,
            };
        }
        self.second.step()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
