//! Controller task wiring.
//!
//! Spawns the three periodic control tasks at their production cadences:
//!
//! | task       | period  |
//! |------------|---------|
//! | supervisor | 500 ms  |
//! | sampler    | 250 ms  |
//! | engine     | 1 s     |
//!
//! The host build drives the simulated plant through the real sensor driver
//! and SSR/vent outputs; on the embedded target the same wiring runs against
//! the hardware peripherals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use driver_max31855::Max31855;
use kiln_core::clock::{MonotonicClock, SystemClock, WallClock};
use kiln_core::command::CommandInbox;
use kiln_core::engine::{ElementCounter, EngineHandles, FiringEngine, ENGINE_PERIOD_MS};
use kiln_core::error::ErrorCell;
use kiln_core::events::EventGroup;
use kiln_core::progress::ProgressCell;
use kiln_core::safety::{DutyCell, SafetySupervisor, SsrCommand, SUPERVISOR_PERIOD_MS};
use kiln_core::sensor::{ReadingCell, ThermocoupleReading, SAMPLE_PERIOD_MS};
use kiln_core::settings::SharedSettings;
use kiln_sim::harness::{SimSsr, SimVent};
use kiln_sim::{FirstOrderKiln, SimSpi};
use kiln_store::DirStore;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::SimConfig;

/// Handles shared with the control interface.
#[derive(Clone)]
pub struct Controller {
    pub inbox: Arc<CommandInbox>,
    pub reading: Arc<ReadingCell>,
    pub progress: Arc<ProgressCell>,
    pub error: Arc<ErrorCell>,
    pub events: Arc<EventGroup>,
    pub element_seconds: Arc<ElementCounter>,
    pub settings: SharedSettings,
    /// Set by the control interface; the supervisor task releases the latch
    /// on its next period.
    pub clear_requested: Arc<AtomicBool>,
}

/// Builds the shared cells and spawns the supervisor, sampler, and engine
/// tasks against the simulated kiln.
pub fn spawn_controller(
    settings: SharedSettings,
    store: DirStore,
    sim_config: &SimConfig,
) -> Controller {
    let inbox = Arc::new(CommandInbox::new());
    let reading = Arc::new(ReadingCell::new());
    let duty = Arc::new(DutyCell::new());
    let events = Arc::new(EventGroup::new());
    let error = Arc::new(ErrorCell::new());
    let progress = Arc::new(ProgressCell::new());
    let element_seconds = Arc::new(ElementCounter::new());
    let clear_requested = Arc::new(AtomicBool::new(false));
    let clock = SystemClock::new();

    let mut plant = FirstOrderKiln::new();
    plant.ambient_c = sim_config.ambient_c;
    plant.set_temp_c(sim_config.ambient_c);
    plant.tau_heat_s = sim_config.tau_heat_s;
    plant.tau_cool_s = sim_config.tau_cool_s;
    plant.element_max_c = sim_config.element_max_c;
    let plant = Arc::new(Mutex::new(plant));

    let spi = SimSpi::new();
    let spi_state = spi.state();
    let sensor = Max31855::new(spi);

    let ssr = SimSsr::default();
    let vent = SimVent::default();

    // Safety supervisor: highest-priority loop, sole owner of the SSR.
    let supervisor = SafetySupervisor::new(
        ssr.clone(),
        vent,
        duty.clone(),
        events.clone(),
        error.clone(),
        reading.clone(),
        settings.clone(),
    );
    tokio::spawn(supervisor_task(
        supervisor,
        clock.clone(),
        clear_requested.clone(),
    ));

    // Sensor sampler: steps the plant and publishes decoded readings.
    tokio::spawn(sampler_task(
        sensor,
        spi_state,
        plant,
        ssr,
        reading.clone(),
        clock.clone(),
    ));

    // Firing engine.
    let engine = FiringEngine::new(
        EngineHandles {
            inbox: inbox.clone(),
            reading: reading.clone(),
            settings: settings.clone(),
            ssr: SsrCommand::new(duty, events.clone()),
            events: events.clone(),
            error: error.clone(),
            progress: progress.clone(),
            element_seconds: element_seconds.clone(),
        },
        store,
    );
    tokio::spawn(engine_task(engine, clock));

    info!("controller tasks started");

    Controller {
        inbox,
        reading,
        progress,
        error,
        events,
        element_seconds,
        settings,
        clear_requested,
    }
}

async fn supervisor_task(
    mut supervisor: SafetySupervisor<SimSsr, SimVent>,
    clock: SystemClock,
    clear_requested: Arc<AtomicBool>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(SUPERVISOR_PERIOD_MS));
    loop {
        interval.tick().await;
        let now_us = clock.now_us();
        if clear_requested.swap(false, Ordering::SeqCst) {
            info!("releasing emergency latch on request");
            supervisor.clear_emergency(now_us);
        }
        supervisor.step(now_us);
    }
}

async fn sampler_task(
    mut sensor: Max31855<SimSpi>,
    spi_state: Arc<Mutex<kiln_sim::SpiState>>,
    plant: Arc<Mutex<FirstOrderKiln>>,
    ssr: SimSsr,
    reading: Arc<ReadingCell>,
    clock: SystemClock,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(SAMPLE_PERIOD_MS));
    loop {
        interval.tick().await;
        let now_us = clock.now_us();

        // Advance the plant with the level the SSR actually held, then feed
        // the chip model.
        let temp_c = {
            let mut plant = plant.lock();
            let drive = if ssr.is_on() { 1.0 } else { 0.0 };
            plant.step(drive, SAMPLE_PERIOD_MS as f32 / 1000.0);
            plant.temp_c()
        };
        {
            let mut state = spi_state.lock();
            state.temp_c = temp_c;
            state.cold_junction_c = 25.0;
        }

        match sensor.read() {
            Ok(frame) => reading.publish(ThermocoupleReading {
                temperature_c: frame.thermocouple_c,
                cold_junction_c: frame.cold_junction_c,
                faults: frame.faults.bits(),
                timestamp_us: now_us,
            }),
            Err(err) => {
                // Keep the previous cached reading; the supervisor detects
                // prolonged outages via the timestamp.
                warn!(?err, "thermocouple bus error");
            }
        }
    }
}

async fn engine_task(mut engine: FiringEngine<DirStore>, clock: SystemClock) {
    let mut interval = tokio::time::interval(Duration::from_millis(ENGINE_PERIOD_MS));
    loop {
        interval.tick().await;
        engine.tick(clock.now_us(), clock.now_unix_s());
    }
}
