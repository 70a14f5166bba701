//! Firing progress snapshots for observers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Externally visible firing state.
///
/// The engine's internal delayed-start state is exposed as `Idle` with the
/// active flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FiringStatus {
    #[default]
    Idle,
    Heating,
    Holding,
    Cooling,
    Complete,
    Error,
    Paused,
    Autotune,
}

/// A consistent snapshot of the running firing, copied out under a short
/// lock on read and on write.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FiringProgress {
    pub active: bool,
    pub profile_id: String,
    pub current_temp_c: f32,
    pub target_temp_c: f32,
    pub current_segment: u32,
    pub total_segments: u32,
    pub elapsed_seconds: u32,
    pub estimated_remaining_seconds: u32,
    pub status: FiringStatus,
}

/// Shared progress cell: written once per engine tick, read by observers.
#[derive(Debug, Default)]
pub struct ProgressCell(Mutex<FiringProgress>);

impl ProgressCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, progress: FiringProgress) {
        *self.0.lock() = progress;
    }

    pub fn get(&self) -> FiringProgress {
        self.0.lock().clone()
    }
}

/// Convenience alias used across tasks.
pub type SharedProgress = Arc<ProgressCell>;
