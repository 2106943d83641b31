//=========================================================================
// Aetheric Operations — Library Root
//
// Cancellable, chainable units of work driven by a cooperative
// tick scheduler.
//
// Responsibilities:
// - Expose the operation variants (`ManagedOperation`,
//   `CoroutineOperation`, `ManagedReturnOperation<T>`)
// - Expose the scheduler seam and its deterministic implementation
// - Provide a single configuration entry point (`OperationBuilder`)
//
// Typical usage:
// ```
// use std::rc::Rc;
// use aetheric_operations::prelude::*;
// use aetheric_operations::core::scheduler::sequence;
//
// let scheduler = Rc::new(TickScheduler::new());
// let fade = CoroutineOperation::new(
//     scheduler.clone(),
//     Some(Box::new(sequence::wait_ticks(3))),
//     true,
// );
// fade.continue_with_on_complete(|| println!("faded"));
//
// TickDriver::new().with_tps(1000.0).run_until_idle(&scheduler, None);
// assert!(fade.is_completed());
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the operation framework and its collaborators.
// `prelude` re-exports the types and traits most call sites need.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `builder` defines the configuration entry point.
//
mod builder;

//--- Public Exports ------------------------------------------------------

pub use builder::OperationBuilder;
