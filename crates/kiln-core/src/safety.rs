//! The safety supervisor: sole owner of the SSR output.
//!
//! The supervisor runs at the highest priority of any task in the system.
//! Every period it checks the latest thermocouple sample against the
//! sensor-fault deadline and the hard temperature ceiling, and translates
//! the commanded duty cycle into time-proportional SSR pulses. On any
//! violation it latches an emergency stop: SSR low, duty zeroed, vent relay
//! open, emergency bit set. Only an explicit [`SafetySupervisor::clear_emergency`]
//! releases the latch.
//!
//! The firing engine never calls into the supervisor. It publishes the
//! desired duty through an [`SsrCommand`] handle and observes the emergency
//! bit through the shared [`EventGroup`].

use std::sync::Arc;

use core::sync::atomic::{AtomicU32, Ordering};
use thermal::window::{TimeProportionalWindow, DEFAULT_WINDOW_US};
use tracing::{error, warn};

use crate::error::{ErrorCell, FiringErrorCode};
use crate::events::{self, EventGroup};
use crate::sensor::ReadingCell;
use crate::settings::{SharedSettings, HARDWARE_CEILING_C};

/// Supervisor cadence.
pub const SUPERVISOR_PERIOD_MS: u64 = 500;

/// A reading (or a fault-free reading) older than this trips the supervisor.
pub const SENSOR_DEADLINE_US: u64 = 5_000_000;

/// The SSR drive output. On hardware this is a GPIO; in tests and
/// simulation it is a recording fake.
pub trait SsrOutput: Send {
    fn set_active(&mut self, on: bool);
}

/// The vent relay output, opened on emergency stop.
pub trait VentOutput: Send {
    fn set_open(&mut self, open: bool);
}

/// Shared duty setpoint, stored as `f32` bits in an atomic word so the
/// engine and supervisor never contend on a lock for it.
#[derive(Debug, Default)]
pub struct DutyCell(AtomicU32);

impl DutyCell {
    pub fn new() -> Self {
        Self(AtomicU32::new(0.0f32.to_bits()))
    }

    pub fn set(&self, duty: f32) {
        let clamped = if duty.is_finite() {
            duty.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.0.store(clamped.to_bits(), Ordering::SeqCst);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::SeqCst))
    }
}

/// The engine's handle for publishing desired duty.
///
/// While the emergency latch holds, writes are forced to zero, so a stale
/// engine tick can never re-energize the element.
#[derive(Debug, Clone)]
pub struct SsrCommand {
    duty: Arc<DutyCell>,
    events: Arc<EventGroup>,
}

impl SsrCommand {
    pub fn new(duty: Arc<DutyCell>, events: Arc<EventGroup>) -> Self {
        Self { duty, events }
    }

    pub fn set_duty(&self, duty: f32) {
        if self.events.is_set(events::EMERGENCY_STOP) {
            self.duty.set(0.0);
        } else {
            self.duty.set(duty);
        }
    }

    pub fn duty(&self) -> f32 {
        self.duty.get()
    }
}

/// Owns the SSR and vent outputs and enforces the safety invariants.
pub struct SafetySupervisor<S: SsrOutput, V: VentOutput> {
    ssr: S,
    vent: V,
    duty: Arc<DutyCell>,
    events: Arc<EventGroup>,
    error: Arc<ErrorCell>,
    reading: Arc<ReadingCell>,
    settings: SharedSettings,
    window: TimeProportionalWindow,
    last_fault_free_us: u64,
}

impl<S: SsrOutput, V: VentOutput> SafetySupervisor<S, V> {
    pub fn new(
        ssr: S,
        vent: V,
        duty: Arc<DutyCell>,
        events: Arc<EventGroup>,
        error: Arc<ErrorCell>,
        reading: Arc<ReadingCell>,
        settings: SharedSettings,
    ) -> Self {
        Self {
            ssr,
            vent,
            duty,
            events,
            error,
            reading,
            settings,
            window: TimeProportionalWindow::new(DEFAULT_WINDOW_US),
            last_fault_free_us: 0,
        }
    }

    /// One supervisor period: run the safety checks, then drive the SSR.
    pub fn step(&mut self, now_us: u64) {
        let reading = self.reading.get();
        let ceiling_c = self.ceiling_c();

        if reading.is_faulted() {
            if now_us.saturating_sub(self.last_fault_free_us) > SENSOR_DEADLINE_US {
                self.emergency_stop(FiringErrorCode::TempFault, now_us);
            }
        } else {
            self.last_fault_free_us = reading.timestamp_us;
            if reading.temperature_c > ceiling_c {
                error!(
                    temp_c = reading.temperature_c,
                    ceiling_c, "over-temperature detected"
                );
                self.emergency_stop(FiringErrorCode::OverTemp, now_us);
            } else if now_us.saturating_sub(reading.timestamp_us) > SENSOR_DEADLINE_US {
                warn!("sensor readings went stale");
                self.emergency_stop(FiringErrorCode::TempFault, now_us);
            }
        }

        // The latch may also have been set by the engine's guards; while it
        // holds, the stored duty stays zeroed and the vent stays open.
        let duty = if self.is_latched() {
            self.duty.set(0.0);
            self.vent.set_open(true);
            0.0
        } else {
            self.duty.get()
        };
        let level = self.window.level(duty, now_us);
        self.ssr.set_active(level);
    }

    /// The enforced ceiling: the configured limit, but never above the
    /// hardware maximum.
    fn ceiling_c(&self) -> f32 {
        self.settings.lock().max_safe_temp_c().min(HARDWARE_CEILING_C)
    }

    pub fn is_latched(&self) -> bool {
        self.events.is_set(events::EMERGENCY_STOP)
    }

    /// Latches an emergency stop: SSR low immediately, duty zeroed, vent
    /// open. Idempotent; the first reason wins.
    pub fn emergency_stop(&mut self, code: FiringErrorCode, now_us: u64) {
        self.ssr.set_active(false);
        self.duty.set(0.0);
        self.vent.set_open(true);

        if !self.is_latched() {
            error!(?code, "EMERGENCY STOP");
            self.error.set_if_none(code);
        }
        let mut bits = events::EMERGENCY_STOP;
        if code == FiringErrorCode::TempFault {
            bits |= events::TEMP_FAULT;
        }
        self.events.set(bits);
        self.window.reset(now_us);
    }

    /// Releases the latch. The fault-free deadline restarts from `now_us` so
    /// a still-recovering sensor gets a full grace period.
    pub fn clear_emergency(&mut self, now_us: u64) {
        self.events
            .clear(events::EMERGENCY_STOP | events::TEMP_FAULT);
        self.error.clear();
        self.last_fault_free_us = now_us;
        self.vent.set_open(false);
        self.window.reset(now_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ThermocoupleReading;
    use crate::settings::{self, KilnSettings};

    #[derive(Default)]
    struct FakeSsr(Arc<AtomicU32>);
    impl SsrOutput for FakeSsr {
        fn set_active(&mut self, on: bool) {
            self.0.store(on as u32, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeVent(Arc<AtomicU32>);
    impl VentOutput for FakeVent {
        fn set_open(&mut self, open: bool) {
            self.0.store(open as u32, Ordering::SeqCst);
        }
    }

    struct Rig {
        supervisor: SafetySupervisor<FakeSsr, FakeVent>,
        ssr_level: Arc<AtomicU32>,
        vent_open: Arc<AtomicU32>,
        duty: Arc<DutyCell>,
        events: Arc<EventGroup>,
        error: Arc<ErrorCell>,
        reading: Arc<ReadingCell>,
    }

    fn rig() -> Rig {
        let ssr_level = Arc::new(AtomicU32::new(0));
        let vent_open = Arc::new(AtomicU32::new(0));
        let duty = Arc::new(DutyCell::new());
        let events = Arc::new(EventGroup::new());
        let error = Arc::new(ErrorCell::new());
        let reading = Arc::new(ReadingCell::new());
        let settings = settings::shared(KilnSettings::default());

        let supervisor = SafetySupervisor::new(
            FakeSsr(ssr_level.clone()),
            FakeVent(vent_open.clone()),
            duty.clone(),
            events.clone(),
            error.clone(),
            reading.clone(),
            settings,
        );

        Rig {
            supervisor,
            ssr_level,
            vent_open,
            duty,
            events,
            error,
            reading,
        }
    }

    fn publish(rig: &Rig, temp_c: f32, faults: u8, timestamp_us: u64) {
        rig.reading.publish(ThermocoupleReading {
            temperature_c: temp_c,
            cold_junction_c: 25.0,
            faults,
            timestamp_us,
        });
    }

    #[test]
    fn test_normal_operation_drives_window() {
        let mut rig = rig();
        publish(&rig, 500.0, 0, 0);
        rig.duty.set(1.0);

        rig.supervisor.step(0);
        assert_eq!(rig.ssr_level.load(Ordering::SeqCst), 1);
        assert!(!rig.supervisor.is_latched());
    }

    #[test]
    fn test_over_temperature_trips_within_one_step() {
        let mut rig = rig();
        rig.duty.set(0.8);
        publish(&rig, 1401.0, 0, 1_000_000);

        rig.supervisor.step(1_000_000);

        assert!(rig.events.is_set(events::EMERGENCY_STOP));
        assert_eq!(rig.error.get(), FiringErrorCode::OverTemp);
        assert_eq!(rig.ssr_level.load(Ordering::SeqCst), 0);
        assert_eq!(rig.vent_open.load(Ordering::SeqCst), 1);
        assert_eq!(rig.duty.get(), 0.0);
    }

    #[test]
    fn test_configured_ceiling_is_enforced() {
        let mut rig = rig();
        // Default max_safe_temp is 1320: 1350 must trip even though it is
        // below the hardware ceiling.
        publish(&rig, 1350.0, 0, 1_000_000);
        rig.supervisor.step(1_000_000);
        assert_eq!(rig.error.get(), FiringErrorCode::OverTemp);
    }

    #[test]
    fn test_sensor_fault_grace_then_trip() {
        let mut rig = rig();

        // A healthy sample establishes the fault-free baseline.
        publish(&rig, 500.0, 0, 1_000_000);
        rig.supervisor.step(1_000_000);
        assert!(!rig.supervisor.is_latched());

        // Faulted samples keep arriving: within the deadline nothing trips.
        publish(&rig, 0.0, crate::sensor::fault::OPEN_CIRCUIT, 4_000_000);
        rig.supervisor.step(4_000_000);
        assert!(!rig.supervisor.is_latched());

        // Past the 5 s deadline the supervisor latches TempFault.
        publish(&rig, 0.0, crate::sensor::fault::OPEN_CIRCUIT, 6_500_000);
        rig.supervisor.step(6_500_000);
        assert!(rig.supervisor.is_latched());
        assert!(rig.events.is_set(events::TEMP_FAULT));
        assert_eq!(rig.error.get(), FiringErrorCode::TempFault);
    }

    #[test]
    fn test_stale_sensor_trips() {
        let mut rig = rig();
        publish(&rig, 500.0, 0, 1_000_000);
        rig.supervisor.step(1_000_000);

        // No new sample for > 5 s.
        rig.supervisor.step(6_500_000);
        assert!(rig.supervisor.is_latched());
        assert_eq!(rig.error.get(), FiringErrorCode::TempFault);
    }

    #[test]
    fn test_latch_forces_duty_to_zero_until_cleared() {
        let mut rig = rig();
        publish(&rig, 1401.0, 0, 1_000_000);
        rig.supervisor.step(1_000_000);
        assert!(rig.supervisor.is_latched());

        // Commands through the engine handle are forced to zero.
        let command = SsrCommand::new(rig.duty.clone(), rig.events.clone());
        command.set_duty(0.9);
        assert_eq!(command.duty(), 0.0);

        // SSR stays low across further steps.
        publish(&rig, 500.0, 0, 2_000_000);
        rig.supervisor.step(2_000_000);
        assert_eq!(rig.ssr_level.load(Ordering::SeqCst), 0);

        rig.supervisor.clear_emergency(3_000_000);
        assert!(!rig.supervisor.is_latched());
        assert_eq!(rig.error.get(), FiringErrorCode::None);
        assert_eq!(rig.vent_open.load(Ordering::SeqCst), 0);

        command.set_duty(0.9);
        assert_eq!(command.duty(), 0.9);
    }
}
