//! Completed-firing records.

use serde::{Deserialize, Serialize};

use crate::error::FiringErrorCode;

/// Maximum number of retained history records; older records (and their
/// trace files) are evicted by lowest id.
pub const MAX_HISTORY_RECORDS: usize = 20;

/// How a firing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiringOutcome {
    Complete,
    Error,
    Aborted,
}

/// One completed (or aborted) firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonically increasing id, also the key of the trace file.
    pub id: u32,
    /// Wall-clock start of the firing, Unix seconds.
    pub started_at_unix: u64,
    pub profile_id: String,
    pub profile_name: String,
    pub peak_temp_c: f32,
    pub total_seconds: u32,
    pub outcome: FiringOutcome,
    pub error_code: FiringErrorCode,
    /// Seconds the element was energized during this firing, for cost
    /// estimates against the configured element wattage.
    pub element_on_seconds: u32,
}
