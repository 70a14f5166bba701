//! Atomic event bits shared between the supervisor, the engine, and
//! observers. The embedded analog is a FreeRTOS event group; here it is a
//! single atomic word that consumers poll.

use core::sync::atomic::{AtomicU32, Ordering};

/// The supervisor latched an emergency stop. Only an explicit
/// [`EventGroup::clear`] releases it.
pub const EMERGENCY_STOP: u32 = 1 << 0;
/// A thermocouple fault persisted past the sensor-fault deadline.
pub const TEMP_FAULT: u32 = 1 << 1;
/// A firing ran to completion.
pub const FIRING_COMPLETE: u32 = 1 << 2;

/// A set of atomic event bits.
#[derive(Debug, Default)]
pub struct EventGroup(AtomicU32);

impl EventGroup {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn set(&self, bits: u32) {
        self.0.fetch_or(bits, Ordering::SeqCst);
    }

    pub fn clear(&self, bits: u32) {
        self.0.fetch_and(!bits, Ordering::SeqCst);
    }

    pub fn is_set(&self, bits: u32) -> bool {
        self.0.load(Ordering::SeqCst) & bits != 0
    }

    pub fn snapshot(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
