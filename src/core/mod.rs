//=========================================================================
// Core Systems
//
// Everything the operation framework is built from.
//
// Responsibilities:
// - `operation`: lifecycle state machines and continuation callbacks
// - `scheduler`: the cooperative scheduler contract, a deterministic
//   tick scheduler and a fixed-rate driver for it
// - `diagnostics`: side channel for cancellation errors
// - `easing`: interpolation curves used by tween sequences
//
// Notes:
// All operation and scheduler types are single-threaded (`Rc`-based).
// Cross-thread traffic is limited to crossbeam channels: diagnostic
// reports out, shutdown signals in.
//
//=========================================================================

//=== Public Modules ======================================================

pub mod diagnostics;
pub mod easing;
pub mod operation;
pub mod scheduler;
