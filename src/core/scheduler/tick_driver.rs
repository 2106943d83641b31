//=========================================================================
// Tick Driver
//=========================================================================
//
// Fixed-rate loop that ticks a `TickScheduler` on the calling thread.
//
// Each iteration:
//  1. Stops if the scheduler is idle or the tick limit is reached
//  2. Ticks the scheduler once
//  3. Waits out the rest of the tick, listening for shutdown
//
// Shutdown is signalled from any thread by sending `()` on (or dropping
// the sender of) a crossbeam channel.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::TickScheduler;

//=== DriverExit ==========================================================

/// Why [`TickDriver::run_until_idle`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverExit {
    /// No live sequence remained.
    Idle,

    /// A shutdown signal arrived or its sender was dropped.
    Shutdown,

    /// The configured tick limit was reached.
    TickLimit,
}

//=== TickDriver ==========================================================

/// Runs a scheduler at a fixed number of ticks per second.
///
/// # Default Values
///
/// - **TPS**: 60.0
/// - **Tick limit**: none
///
/// ```
/// use aetheric_operations::prelude::*;
/// use aetheric_operations::core::scheduler::sequence;
///
/// let scheduler = TickScheduler::new();
/// scheduler.submit(Box::new(sequence::wait_ticks(3)));
///
/// let exit = TickDriver::new().with_tps(1000.0).run_until_idle(&scheduler, None);
/// assert_eq!(exit, DriverExit::Idle);
/// ```
#[derive(Debug, Clone)]
pub struct TickDriver {
    tps: f64,
    max_ticks: Option<u64>,
}

impl TickDriver {
    /// Creates a driver with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            max_ticks: None,
        }
    }

    /// Sets the target ticks per second.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Stops after `max_ticks` ticks even if sequences are still live.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Duration of one tick at the configured rate.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tps)
    }

    //--- Execution --------------------------------------------------------

    /// Ticks `scheduler` until it is idle, the tick limit is reached or a
    /// shutdown signal arrives on `shutdown`.
    pub fn run_until_idle(
        &self,
        scheduler: &TickScheduler,
        shutdown: Option<&Receiver<()>>,
    ) -> DriverExit {
        let tick_duration = self.tick_duration();
        let mut ticks: u64 = 0;

        info!("Tick driver starting (TPS: {}, limit: {:?})", self.tps, self.max_ticks);

        let exit = loop {
            let tick_start = Instant::now();

            //--- Step 1: Check exit conditions ----------------------------
            if scheduler.is_idle() {
                break DriverExit::Idle;
            }
            if self.max_ticks.is_some_and(|limit| ticks >= limit) {
                break DriverExit::TickLimit;
            }

            //--- Step 2: Advance sequences --------------------------------
            scheduler.tick();
            ticks += 1;

            if scheduler.is_idle() {
                break DriverExit::Idle;
            }

            //--- Step 3: Maintain pacing ----------------------------------
            let remaining = tick_duration.saturating_sub(tick_start.elapsed());
            match shutdown {
                Some(receiver) => match receiver.recv_timeout(remaining) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break DriverExit::Shutdown,
                    Err(RecvTimeoutError::Timeout) => {}
                },
                None => {
                    if !remaining.is_zero() {
                        thread::sleep(remaining);
                    }
                }
            }
        };

        debug!("Tick driver ran {} ticks", ticks);
        info!("Tick driver exited: {:?}", exit);
        exit
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
