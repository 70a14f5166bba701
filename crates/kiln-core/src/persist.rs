//! Persistence capability used by the firing engine.
//!
//! The engine records history, traces, tuned gains, and element-on time
//! through this trait. Implementations live outside the core (flash-backed
//! in the store crate, in-memory in tests); failures are reported but the
//! engine treats them as non-fatal and keeps controlling the kiln.

use thermal::pid::PidGains;
use thiserror::Error;

use crate::history::HistoryRecord;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage operations the engine depends on.
pub trait Persistence: Send {
    /// Allocates the next monotonic firing id.
    fn next_firing_id(&mut self) -> u32;

    /// Appends a completed-firing record, evicting the oldest if full.
    fn record_firing(&mut self, record: &HistoryRecord) -> Result<(), PersistError>;

    /// Appends one minute-resolution trace sample for the active firing.
    fn append_trace(&mut self, firing_id: u32, time_s: u32, temp_c: f32)
        -> Result<(), PersistError>;

    /// Loads persisted PID gains, falling back to defaults when absent.
    fn load_gains(&mut self) -> PidGains;

    fn save_gains(&mut self, gains: PidGains) -> Result<(), PersistError>;

    /// Loads the lifetime element-on counter in seconds (0 when absent).
    fn load_element_seconds(&mut self) -> u32;

    fn save_element_seconds(&mut self, seconds: u32) -> Result<(), PersistError>;
}

/// A persistence sink that keeps nothing. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct NullPersistence {
    next_id: u32,
}

impl Persistence for NullPersistence {
    fn next_firing_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record_firing(&mut self, _record: &HistoryRecord) -> Result<(), PersistError> {
        Ok(())
    }

    fn append_trace(
        &mut self,
        _firing_id: u32,
        _time_s: u32,
        _temp_c: f32,
    ) -> Result<(), PersistError> {
        Ok(())
    }

    fn load_gains(&mut self) -> PidGains {
        PidGains::default()
    }

    fn save_gains(&mut self, _gains: PidGains) -> Result<(), PersistError> {
        Ok(())
    }

    fn load_element_seconds(&mut self) -> u32 {
        0
    }

    fn save_element_seconds(&mut self, _seconds: u32) -> Result<(), PersistError> {
        Ok(())
    }
}
