//! Thermocouple reading types and the shared latest-reading cell.

use parking_lot::Mutex;
use serde::Serialize;

/// Fault flag bits carried in [`ThermocoupleReading::faults`], matching the
/// three least-significant bits of the MAX31855 frame.
pub mod fault {
    /// Thermocouple input is open.
    pub const OPEN_CIRCUIT: u8 = 1 << 0;
    /// Thermocouple shorted to ground.
    pub const SHORT_TO_GND: u8 = 1 << 1;
    /// Thermocouple shorted to the supply rail.
    pub const SHORT_TO_VCC: u8 = 1 << 2;
}

/// One thermocouple sample.
///
/// While a fault flag is active the temperature fields read 0.0; the sample
/// still updates so downstream code observes the fault and its timestamp.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ThermocoupleReading {
    /// Hot-junction temperature in °C (0.0 while faulted).
    pub temperature_c: f32,
    /// Cold-junction (amplifier die) temperature in °C.
    pub cold_junction_c: f32,
    /// Active fault bits, see [`fault`].
    pub faults: u8,
    /// Monotonic timestamp of the sample in microseconds.
    pub timestamp_us: u64,
}

impl ThermocoupleReading {
    pub fn is_faulted(&self) -> bool {
        self.faults != 0
    }
}

/// Single-writer/many-reader cell holding the latest sample.
///
/// Readers take a copy under a short critical section; no I/O ever happens
/// while the lock is held, so the sampler is never blocked for long.
#[derive(Debug, Default)]
pub struct ReadingCell(Mutex<ThermocoupleReading>);

impl ReadingCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new sample. Called only by the sensor sampler.
    pub fn publish(&self, reading: ThermocoupleReading) {
        *self.0.lock() = reading;
    }

    /// Returns a copy of the latest sample.
    pub fn get(&self) -> ThermocoupleReading {
        *self.0.lock()
    }
}

/// Sampling cadence of the sensor task.
pub const SAMPLE_PERIOD_MS: u64 = 250;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_returns_latest_copy() {
        let cell = ReadingCell::new();
        assert_eq!(cell.get().timestamp_us, 0);

        cell.publish(ThermocoupleReading {
            temperature_c: 812.5,
            cold_junction_c: 31.0,
            faults: 0,
            timestamp_us: 42,
        });

        let reading = cell.get();
        assert_eq!(reading.temperature_c, 812.5);
        assert_eq!(reading.timestamp_us, 42);
        assert!(!reading.is_faulted());
    }

    #[test]
    fn test_faulted_reading() {
        let reading = ThermocoupleReading {
            temperature_c: 0.0,
            cold_junction_c: 0.0,
            faults: fault::OPEN_CIRCUIT,
            timestamp_us: 7,
        };
        assert!(reading.is_faulted());
    }
}
