//! Simulated time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kiln_core::clock::{MonotonicClock, WallClock};

/// Arbitrary wall-clock origin of the simulation.
pub const SIM_EPOCH_UNIX_S: u64 = 1_700_000_000;

/// A manually advanced clock. Clones share the same instant, so every
/// component in the rig observes the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Arc<AtomicU64>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, us: u64) {
        self.0.fetch_add(us, Ordering::SeqCst);
    }
}

impl MonotonicClock for SimClock {
    fn now_us(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl WallClock for SimClock {
    fn now_unix_s(&self) -> u64 {
        SIM_EPOCH_UNIX_S + self.0.load(Ordering::SeqCst) / 1_000_000
    }
}
