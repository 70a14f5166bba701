//! # Kiln Simulation
//!
//! A deterministic, faster-than-realtime rig for the whole control stack:
//! a first-order thermal plant, a simulated monotonic/wall clock, and a
//! simulated SPI bus that synthesizes MAX31855 frames from the plant state
//! (with injectable faults). The [`harness::KilnHarness`] wires the real
//! sensor driver, safety supervisor, firing engine, and store together at
//! their production cadences, driven entirely by the simulated clock.
//!
//! The integration scenarios in `tests/` run complete firings through this
//! rig in milliseconds of host time.

pub mod clock;
pub mod harness;
pub mod plant;
pub mod spi;

pub use clock::SimClock;
pub use harness::KilnHarness;
pub use plant::FirstOrderKiln;
pub use spi::{SimSpi, SpiState};
