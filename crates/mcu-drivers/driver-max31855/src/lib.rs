//! A `no_std` driver for the MAX31855 cold-junction compensated
//! thermocouple-to-digital converter.
//!
//! The chip is read-only: every SPI transaction clocks out one 32-bit frame
//! containing the thermocouple temperature, the cold-junction (die)
//! temperature, and fault flags. The bus must run in SPI mode 0 at 5 MHz or
//! less.
//!
//! Frame layout, MSB first:
//!
//! | Bits   | Content                                             |
//! |--------|-----------------------------------------------------|
//! | 31..18 | Thermocouple temperature, 14-bit two's complement, 0.25 °C/LSB |
//! | 17     | Reserved                                            |
//! | 16     | Fault summary bit                                   |
//! | 15..4  | Cold-junction temperature, 12-bit two's complement, 0.0625 °C/LSB |
//! | 3      | Reserved                                            |
//! | 2      | Short-to-VCC fault                                  |
//! | 1      | Short-to-GND fault                                  |
//! | 0      | Open-circuit fault                                  |

#![cfg_attr(not(test), no_std)]

use embedded_hal::spi::SpiDevice;

/// Fault flags reported in the three least-significant frame bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Faults(u8);

impl Faults {
    /// The thermocouple input is open (broken or disconnected wire).
    pub const OPEN_CIRCUIT: u8 = 1 << 0;
    /// The thermocouple is shorted to ground.
    pub const SHORT_TO_GND: u8 = 1 << 1;
    /// The thermocouple is shorted to the supply rail.
    pub const SHORT_TO_VCC: u8 = 1 << 2;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_any(self) -> bool {
        self.0 != 0
    }

    pub fn is_open_circuit(self) -> bool {
        self.0 & Self::OPEN_CIRCUIT != 0
    }

    pub fn is_short_to_gnd(self) -> bool {
        self.0 & Self::SHORT_TO_GND != 0
    }

    pub fn is_short_to_vcc(self) -> bool {
        self.0 & Self::SHORT_TO_VCC != 0
    }
}

/// One decoded MAX31855 frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Thermocouple temperature in °C. Forced to 0.0 while a fault is active.
    pub thermocouple_c: f32,
    /// Cold-junction temperature in °C. Forced to 0.0 while a fault is active.
    pub cold_junction_c: f32,
    /// Active fault flags, empty when the reading is valid.
    pub faults: Faults,
}

impl Frame {
    /// Decodes a raw 32-bit frame as clocked out of the chip.
    pub fn decode(raw: u32) -> Self {
        if raw & (1 << 16) != 0 {
            return Self {
                thermocouple_c: 0.0,
                cold_junction_c: 0.0,
                faults: Faults((raw & 0x7) as u8),
            };
        }

        // Sign-extend the 14-bit thermocouple field (bits 31..18).
        let tc_raw = ((raw >> 18) as i32) << 18 >> 18;
        // Sign-extend the 12-bit cold-junction field (bits 15..4).
        let cj_raw = (((raw >> 4) & 0xFFF) as i32) << 20 >> 20;

        Self {
            thermocouple_c: tc_raw as f32 * 0.25,
            cold_junction_c: cj_raw as f32 * 0.0625,
            faults: Faults(0),
        }
    }
}

/// A MAX31855 on an SPI bus.
pub struct Max31855<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Max31855<SPI> {
    /// Creates a driver from a configured SPI device (mode 0, ≤ 5 MHz).
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Reads and decodes one conversion frame.
    pub fn read(&mut self) -> Result<Frame, SPI::Error> {
        let mut buf = [0u8; 4];
        self.spi.read(&mut buf)?;
        Ok(Frame::decode(u32::from_be_bytes(buf)))
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn test_decode_positive_temperatures() {
        // +100.75 °C thermocouple (0x193 << 18), +25.0625 °C cold junction
        // (0x191 << 4).
        let frame = Frame::decode(0x064C_1910);
        assert_eq!(frame.thermocouple_c, 100.75);
        assert_eq!(frame.cold_junction_c, 25.0625);
        assert!(!frame.faults.is_any());
    }

    #[test]
    fn test_decode_datasheet_maximum() {
        // 1600 °C is 6400 counts (0x1900).
        let frame = Frame::decode(0x1900 << 18);
        assert_eq!(frame.thermocouple_c, 1600.0);
    }

    #[test]
    fn test_decode_negative_temperatures() {
        // -0.25 °C thermocouple is 0x3FFF in 14-bit two's complement.
        let frame = Frame::decode(0x3FFF << 18);
        assert_eq!(frame.thermocouple_c, -0.25);

        // -250 °C thermocouple (-1000 counts), -55 °C cold junction
        // (-880 counts = 0xC90).
        let raw = ((-1000i32 as u32 & 0x3FFF) << 18) | ((-880i32 as u32 & 0xFFF) << 4);
        let frame = Frame::decode(raw);
        assert_eq!(frame.thermocouple_c, -250.0);
        assert_eq!(frame.cold_junction_c, -55.0);
    }

    #[test]
    fn test_decode_fault_zeroes_temperatures() {
        // Fault summary bit plus open-circuit flag; the temperature fields
        // still carry stale data that must be ignored.
        let raw = (0x193 << 18) | (1 << 16) | (0x191 << 4) | 0x1;
        let frame = Frame::decode(raw);
        assert_eq!(frame.thermocouple_c, 0.0);
        assert_eq!(frame.cold_junction_c, 0.0);
        assert!(frame.faults.is_open_circuit());
        assert!(!frame.faults.is_short_to_gnd());
        assert!(!frame.faults.is_short_to_vcc());
    }

    #[test]
    fn test_decode_all_fault_flags() {
        let frame = Frame::decode((1 << 16) | 0x7);
        assert!(frame.faults.is_open_circuit());
        assert!(frame.faults.is_short_to_gnd());
        assert!(frame.faults.is_short_to_vcc());
        assert_eq!(frame.faults.bits(), 0x7);
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        let frame = Frame::decode((0x193 << 18) | (1 << 17) | (1 << 3));
        assert_eq!(frame.thermocouple_c, 100.75);
        assert!(!frame.faults.is_any());
    }

    #[test]
    fn test_read_over_spi() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::read_vec(vec![0x06, 0x4C, 0x19, 0x10]),
            SpiTransaction::transaction_end(),
        ];
        let mut spi = SpiMock::new(&expectations);

        let mut sensor = Max31855::new(spi.clone());
        let frame = sensor.read().unwrap();
        assert_eq!(frame.thermocouple_c, 100.75);
        assert_eq!(frame.cold_junction_c, 25.0625);

        spi.done();
    }
}
