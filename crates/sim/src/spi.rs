//! A simulated SPI bus carrying MAX31855 frames.
//!
//! The rig points the real sensor driver at this device, so the production
//! decode path is exercised end to end: plant temperature in, decoded
//! reading out, including fault flags and bus errors.

use std::sync::Arc;

use embedded_hal::spi::{ErrorKind, ErrorType, Operation, SpiDevice};
use parking_lot::Mutex;

/// What the simulated chip would report next.
#[derive(Debug, Clone, Default)]
pub struct SpiState {
    pub temp_c: f32,
    pub cold_junction_c: f32,
    /// Fault bits to raise (frame bit 16 plus the three LSBs).
    pub faults: u8,
    /// When set, transactions fail outright instead of returning a frame.
    pub bus_error: bool,
}

/// Encodes the chip's 32-bit frame for the given state.
pub fn encode_frame(state: &SpiState) -> u32 {
    if state.faults != 0 {
        return (1 << 16) | u32::from(state.faults & 0x7);
    }
    let tc_counts = (state.temp_c / 0.25).round() as i32;
    let cj_counts = (state.cold_junction_c / 0.0625).round() as i32;
    ((tc_counts as u32 & 0x3FFF) << 18) | ((cj_counts as u32 & 0xFFF) << 4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSpiError;

impl embedded_hal::spi::Error for SimSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// The bus device handed to the sensor driver. Clones share state with the
/// harness, which updates the reported temperature every plant step.
#[derive(Debug, Clone, Default)]
pub struct SimSpi(Arc<Mutex<SpiState>>);

impl SimSpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared state handle used to script the chip.
    pub fn state(&self) -> Arc<Mutex<SpiState>> {
        self.0.clone()
    }
}

impl ErrorType for SimSpi {
    type Error = SimSpiError;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let state = self.0.lock().clone();
        if state.bus_error {
            return Err(SimSpiError);
        }
        let frame = encode_frame(&state).to_be_bytes();
        for operation in operations {
            match operation {
                Operation::Read(buf) | Operation::TransferInPlace(buf) => {
                    for (dst, src) in buf.iter_mut().zip(frame.iter().cycle()) {
                        *dst = *src;
                    }
                }
                Operation::Transfer(read, _) => {
                    for (dst, src) in read.iter_mut().zip(frame.iter().cycle()) {
                        *dst = *src;
                    }
                }
                Operation::Write(_) | Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}
