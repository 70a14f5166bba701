//! Full-stack simulation harness.
//!
//! Wires the production components together exactly as the host runtime
//! does — sensor driver over the (simulated) SPI bus, safety supervisor,
//! firing engine, in-memory store — and steps them at their real cadences
//! (sampler 250 ms, supervisor 500 ms, engine 1 s) against the simulated
//! clock and plant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use driver_max31855::Max31855;
use kiln_core::clock::{MonotonicClock, WallClock};
use kiln_core::command::{Command, CommandError, CommandInbox};
use kiln_core::engine::{ElementCounter, EngineHandles, FiringEngine};
use kiln_core::error::{ErrorCell, FiringErrorCode};
use kiln_core::events::EventGroup;
use kiln_core::progress::{FiringProgress, ProgressCell};
use kiln_core::safety::{DutyCell, SafetySupervisor, SsrCommand, SsrOutput, VentOutput};
use kiln_core::sensor::{ReadingCell, ThermocoupleReading};
use kiln_core::settings::{self, KilnSettings, SharedSettings};
use kiln_store::MemStore;
use parking_lot::Mutex;

use crate::clock::SimClock;
use crate::plant::FirstOrderKiln;
use crate::spi::{SimSpi, SpiState};

/// SSR drive level shared between the supervisor output and the plant.
#[derive(Debug, Clone, Default)]
pub struct SimSsr(Arc<AtomicBool>);

impl SimSsr {
    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl SsrOutput for SimSsr {
    fn set_active(&mut self, on: bool) {
        self.0.store(on, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimVent(Arc<AtomicBool>);

impl SimVent {
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl VentOutput for SimVent {
    fn set_open(&mut self, open: bool) {
        self.0.store(open, Ordering::SeqCst);
    }
}

/// The complete simulated controller.
pub struct KilnHarness {
    pub clock: SimClock,
    pub plant: FirstOrderKiln,

    sensor: Max31855<SimSpi>,
    spi_state: Arc<Mutex<SpiState>>,
    /// When set, the reported temperature overrides the plant model.
    injected_temp_c: Option<f32>,

    supervisor: SafetySupervisor<SimSsr, SimVent>,
    engine: FiringEngine<MemStore>,

    ssr: SimSsr,
    vent: SimVent,
    inbox: Arc<CommandInbox>,
    reading: Arc<ReadingCell>,
    duty: Arc<DutyCell>,
    events: Arc<EventGroup>,
    error: Arc<ErrorCell>,
    progress: Arc<ProgressCell>,
    element_seconds: Arc<ElementCounter>,
    pub settings: SharedSettings,
    /// Second view on the engine's store for inspection from tests.
    pub store: MemStore,
}

impl KilnHarness {
    pub fn new() -> Self {
        Self::with_settings(KilnSettings::default())
    }

    pub fn with_settings(kiln_settings: KilnSettings) -> Self {
        let clock = SimClock::new();
        let plant = FirstOrderKiln::new();

        let spi = SimSpi::new();
        let spi_state = spi.state();
        let sensor = Max31855::new(spi);

        let ssr = SimSsr::default();
        let vent = SimVent::default();
        let inbox = Arc::new(CommandInbox::new());
        let reading = Arc::new(ReadingCell::new());
        let duty = Arc::new(DutyCell::new());
        let events = Arc::new(EventGroup::new());
        let error = Arc::new(ErrorCell::new());
        let progress = Arc::new(ProgressCell::new());
        let element_seconds = Arc::new(ElementCounter::new());
        let settings = settings::shared(kiln_settings);

        let store = MemStore::in_memory();

        let supervisor = SafetySupervisor::new(
            ssr.clone(),
            vent.clone(),
            duty.clone(),
            events.clone(),
            error.clone(),
            reading.clone(),
            settings.clone(),
        );

        let engine = FiringEngine::new(
            EngineHandles {
                inbox: inbox.clone(),
                reading: reading.clone(),
                settings: settings.clone(),
                ssr: SsrCommand::new(duty.clone(), events.clone()),
                events: events.clone(),
                error: error.clone(),
                progress: progress.clone(),
                element_seconds: element_seconds.clone(),
            },
            store.clone(),
        );

        Self {
            clock,
            plant,
            sensor,
            spi_state,
            injected_temp_c: None,
            supervisor,
            engine,
            ssr,
            vent,
            inbox,
            reading,
            duty,
            events,
            error,
            progress,
            element_seconds,
            settings,
            store,
        }
    }

    /// Overrides the reported thermocouple temperature (None returns to the
    /// plant model).
    pub fn inject_temp(&mut self, temp_c: Option<f32>) {
        self.injected_temp_c = temp_c;
    }

    /// Raises (or clears) thermocouple fault bits on the simulated chip.
    pub fn inject_faults(&mut self, faults: u8) {
        self.spi_state.lock().faults = faults;
    }

    /// Makes SPI transactions fail (or succeed again).
    pub fn inject_bus_error(&mut self, failing: bool) {
        self.spi_state.lock().bus_error = failing;
    }

    pub fn send(&self, command: Command) -> Result<(), CommandError> {
        self.inbox.send(command)
    }

    pub fn progress(&self) -> FiringProgress {
        self.progress.get()
    }

    pub fn last_error(&self) -> FiringErrorCode {
        self.error.get()
    }

    pub fn is_latched(&self) -> bool {
        self.events.is_set(kiln_core::events::EMERGENCY_STOP)
    }

    pub fn firing_complete_event(&self) -> bool {
        self.events.is_set(kiln_core::events::FIRING_COMPLETE)
    }

    pub fn ssr_on(&self) -> bool {
        self.ssr.is_on()
    }

    pub fn vent_open(&self) -> bool {
        self.vent.is_open()
    }

    pub fn duty(&self) -> f32 {
        self.duty.get()
    }

    pub fn element_seconds(&self) -> u32 {
        self.element_seconds.get()
    }

    /// The gains currently loaded into the engine's PID.
    pub fn pid_gains(&self) -> thermal::pid::PidGains {
        self.engine.pid_gains()
    }

    pub fn latest_reading(&self) -> ThermocoupleReading {
        self.reading.get()
    }

    pub fn clear_emergency(&mut self) {
        let now_us = self.clock.now_us();
        self.supervisor.clear_emergency(now_us);
    }

    /// Advances the whole rig by `ms` of simulated time in 250 ms quanta,
    /// asserting the global duty invariant along the way.
    pub fn run_ms(&mut self, ms: u64) {
        let quanta = ms.div_ceil(250);
        for _ in 0..quanta {
            self.clock.advance_us(250_000);
            let now_us = self.clock.now_us();

            // Plant integrates with the level the SSR actually held.
            let drive = if self.ssr.is_on() { 1.0 } else { 0.0 };
            self.plant.step(drive, 0.25);

            self.sample(now_us);

            if now_us % 500_000 == 0 {
                self.supervisor.step(now_us);
            }
            if now_us % 1_000_000 == 0 {
                self.engine.tick(now_us, self.clock.now_unix_s());
            }

            let duty = self.duty.get();
            assert!((0.0..=1.0).contains(&duty), "duty out of range: {duty}");
        }
    }

    /// Runs until `predicate` holds, panicking after `timeout_s` of
    /// simulated time.
    pub fn run_until(&mut self, timeout_s: u64, mut predicate: impl FnMut(&Self) -> bool) {
        let deadline_us = self.clock.now_us() + timeout_s * 1_000_000;
        while !predicate(self) {
            assert!(
                self.clock.now_us() < deadline_us,
                "condition not reached within {timeout_s} s of simulated time \
                 (status {:?}, temp {:.1})",
                self.progress().status,
                self.latest_reading().temperature_c,
            );
            self.run_ms(1000);
        }
    }

    /// One 250 ms sensor sample: script the chip, run the real driver, and
    /// publish. A bus error keeps the previous cached reading untouched.
    fn sample(&mut self, now_us: u64) {
        {
            let mut state = self.spi_state.lock();
            state.temp_c = self.injected_temp_c.unwrap_or_else(|| self.plant.temp_c());
            state.cold_junction_c = 25.0;
        }

        match self.sensor.read() {
            Ok(frame) => self.reading.publish(ThermocoupleReading {
                temperature_c: frame.thermocouple_c,
                cold_junction_c: frame.cold_junction_c,
                faults: frame.faults.bits(),
                timestamp_us: now_us,
            }),
            Err(_) => {
                // Bus error: retain the previous reading; staleness is
                // detected by the supervisor via the timestamp.
            }
        }
    }
}

impl Default for KilnHarness {
    fn default() -> Self {
        Self::new()
    }
}
