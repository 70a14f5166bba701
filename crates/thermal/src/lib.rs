#![cfg_attr(not(feature = "std"), no_std)]

//! # Thermal Control Crate
//!
//! `thermal` provides the control laws for driving a resistive heating
//! element, written for embedded kiln and furnace controllers but equally
//! usable on host systems for simulation and testing.
//!
//! ## Features
//!
//! - **PID Controller**: A discrete PID controller with back-calculation
//!   anti-windup, producing a duty cycle in a bounded output range.
//! - **Relay Auto-Tune**: An Åström–Hägglund relay experiment that infers the
//!   ultimate gain and period of the plant and derives classical
//!   Ziegler–Nichols PID gains.
//! - **Time-Proportional Output**: Translation of a duty cycle into slow
//!   on/off pulses suitable for a solid-state relay switching a mains load.
//! - **`no_std` support**: Can be used in bare-metal environments.
//! - **Optional `serde` support**: For serializing gains and tuning results.

pub mod autotune;
pub mod pid;
pub mod window;

// Re-export key types
pub use autotune::{AutotunePhase, RelayAutotune};
pub use pid::{Pid, PidGains};
pub use window::TimeProportionalWindow;
