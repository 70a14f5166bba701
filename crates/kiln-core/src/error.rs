//! Firing error taxonomy.

use core::sync::atomic::{AtomicU8, Ordering};
use serde::{Deserialize, Serialize};

/// The reason a firing ended abnormally (or `None` while healthy).
///
/// Stored as a single byte so it can live in an atomic cell shared between
/// the supervisor, the engine, and observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FiringErrorCode {
    #[default]
    None = 0,
    /// The emergency latch was set without a more specific reason.
    EmergencyStop = 1,
    /// Thermocouple open/short, or no fault-free sample within the deadline.
    TempFault = 2,
    /// Measured temperature exceeded the safe ceiling.
    OverTemp = 3,
    /// The kiln failed to gain temperature during a heating segment.
    NotRising = 4,
    /// Observed heating rate far exceeded the programmed ramp.
    Runaway = 5,
    /// Auto-tune timed out or measured a degenerate oscillation.
    AutotuneFailed = 6,
    /// The command inbox was full.
    QueueFull = 7,
}

impl FiringErrorCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::EmergencyStop,
            2 => Self::TempFault,
            3 => Self::OverTemp,
            4 => Self::NotRising,
            5 => Self::Runaway,
            6 => Self::AutotuneFailed,
            7 => Self::QueueFull,
            _ => Self::None,
        }
    }
}

/// Shared last-error cell, written by whichever component detects a fault
/// first and read by observers.
#[derive(Debug, Default)]
pub struct ErrorCell(AtomicU8);

impl ErrorCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(FiringErrorCode::None as u8))
    }

    pub fn set(&self, code: FiringErrorCode) {
        self.0.store(code as u8, Ordering::SeqCst);
    }

    /// Sets `code` only when no error is currently latched, so the first
    /// detected reason survives.
    pub fn set_if_none(&self, code: FiringErrorCode) {
        let _ = self.0.compare_exchange(
            FiringErrorCode::None as u8,
            code as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn get(&self) -> FiringErrorCode {
        FiringErrorCode::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn clear(&self) {
        self.set(FiringErrorCode::None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins() {
        let cell = ErrorCell::new();
        cell.set_if_none(FiringErrorCode::OverTemp);
        cell.set_if_none(FiringErrorCode::Runaway);
        assert_eq!(cell.get(), FiringErrorCode::OverTemp);

        cell.clear();
        assert_eq!(cell.get(), FiringErrorCode::None);
        cell.set_if_none(FiringErrorCode::Runaway);
        assert_eq!(cell.get(), FiringErrorCode::Runaway);
    }

    #[test]
    fn test_roundtrip_from_u8() {
        for code in [
            FiringErrorCode::None,
            FiringErrorCode::EmergencyStop,
            FiringErrorCode::TempFault,
            FiringErrorCode::OverTemp,
            FiringErrorCode::NotRising,
            FiringErrorCode::Runaway,
            FiringErrorCode::AutotuneFailed,
            FiringErrorCode::QueueFull,
        ] {
            assert_eq!(FiringErrorCode::from_u8(code as u8), code);
        }
    }
}
