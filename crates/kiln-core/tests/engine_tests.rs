//! Firing engine state-machine tests against an in-memory persistence fake.
//! Full closed-loop scenarios against the simulated plant live in the sim
//! crate; these tests pin down the transition rules.

use std::sync::Arc;

use parking_lot::Mutex;
use thermal::pid::PidGains;

use kiln_core::command::Command;
use kiln_core::engine::{ElementCounter, EngineHandles, FiringEngine};
use kiln_core::error::{ErrorCell, FiringErrorCode};
use kiln_core::events::{self, EventGroup};
use kiln_core::history::{FiringOutcome, HistoryRecord};
use kiln_core::persist::{PersistError, Persistence};
use kiln_core::profile::{FiringProfile, FiringSegment};
use kiln_core::progress::{FiringStatus, ProgressCell};
use kiln_core::safety::{DutyCell, SsrCommand};
use kiln_core::sensor::{ReadingCell, ThermocoupleReading};
use kiln_core::settings::{self, KilnSettings};
use kiln_core::command::CommandInbox;

#[derive(Default)]
struct RecordingState {
    records: Vec<HistoryRecord>,
    traces: Vec<(u32, u32, f32)>,
    gains: Option<PidGains>,
    element_seconds: u32,
}

#[derive(Clone, Default)]
struct RecordingPersist(Arc<Mutex<RecordingState>>);

impl Persistence for RecordingPersist {
    fn next_firing_id(&mut self) -> u32 {
        self.0.lock().records.len() as u32 + 1
    }

    fn record_firing(&mut self, record: &HistoryRecord) -> Result<(), PersistError> {
        self.0.lock().records.push(record.clone());
        Ok(())
    }

    fn append_trace(&mut self, firing_id: u32, time_s: u32, temp_c: f32) -> Result<(), PersistError> {
        self.0.lock().traces.push((firing_id, time_s, temp_c));
        Ok(())
    }

    fn load_gains(&mut self) -> PidGains {
        self.0.lock().gains.unwrap_or_default()
    }

    fn save_gains(&mut self, gains: PidGains) -> Result<(), PersistError> {
        self.0.lock().gains = Some(gains);
        Ok(())
    }

    fn load_element_seconds(&mut self) -> u32 {
        self.0.lock().element_seconds
    }

    fn save_element_seconds(&mut self, seconds: u32) -> Result<(), PersistError> {
        self.0.lock().element_seconds = seconds;
        Ok(())
    }
}

struct Rig {
    engine: FiringEngine<RecordingPersist>,
    inbox: Arc<CommandInbox>,
    reading: Arc<ReadingCell>,
    events: Arc<EventGroup>,
    error: Arc<ErrorCell>,
    progress: Arc<ProgressCell>,
    duty: Arc<DutyCell>,
    persisted: RecordingPersist,
    now_us: u64,
    wall_s: u64,
}

impl Rig {
    fn new() -> Self {
        let inbox = Arc::new(CommandInbox::new());
        let reading = Arc::new(ReadingCell::new());
        let events = Arc::new(EventGroup::new());
        let error = Arc::new(ErrorCell::new());
        let progress = Arc::new(ProgressCell::new());
        let duty = Arc::new(DutyCell::new());
        let element = Arc::new(ElementCounter::new());
        let persisted = RecordingPersist::default();

        let engine = FiringEngine::new(
            EngineHandles {
                inbox: inbox.clone(),
                reading: reading.clone(),
                settings: settings::shared(KilnSettings::default()),
                ssr: SsrCommand::new(duty.clone(), events.clone()),
                events: events.clone(),
                error: error.clone(),
                progress: progress.clone(),
                element_seconds: element,
            },
            persisted.clone(),
        );

        Rig {
            engine,
            inbox,
            reading,
            events,
            error,
            progress,
            duty,
            persisted,
            now_us: 0,
            wall_s: 1_700_000_000,
        }
    }

    fn set_temp(&self, temp_c: f32) {
        self.reading.publish(ThermocoupleReading {
            temperature_c: temp_c,
            cold_junction_c: 25.0,
            faults: 0,
            timestamp_us: self.now_us,
        });
    }

    /// Advances one engine period with the given measured temperature.
    fn tick(&mut self, temp_c: f32) {
        self.now_us += 1_000_000;
        self.wall_s += 1;
        self.set_temp(temp_c);
        self.engine.tick(self.now_us, self.wall_s);
    }

    fn records(&self) -> Vec<HistoryRecord> {
        self.persisted.0.lock().records.clone()
    }
}

fn segment(ramp: f32, target: f32, hold_minutes: u32) -> FiringSegment {
    FiringSegment {
        id: 0,
        name: "seg".to_string(),
        ramp_rate_c_per_h: ramp,
        target_temp_c: target,
        hold_minutes,
    }
}

fn single_segment_profile(ramp: f32, target: f32, hold_minutes: u32) -> FiringProfile {
    FiringProfile::new("test", "Test", "", &[segment(ramp, target, hold_minutes)]).unwrap()
}

#[test]
fn test_start_enters_heating_and_publishes_progress() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 200.0, 0),
            delay_minutes: 0,
        })
        .unwrap();

    rig.tick(20.0);

    assert_eq!(rig.engine.status(), FiringStatus::Heating);
    let progress = rig.progress.get();
    assert!(progress.active);
    assert_eq!(progress.status, FiringStatus::Heating);
    assert_eq!(progress.profile_id, "test");
    assert_eq!(progress.total_segments, 1);
}

#[test]
fn test_delayed_start_is_exposed_as_idle_until_deadline() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 200.0, 0),
            delay_minutes: 1,
        })
        .unwrap();

    rig.tick(20.0);
    assert_eq!(rig.engine.status(), FiringStatus::Idle);
    assert!(rig.progress.get().active);

    // 60 wall-clock seconds later the firing begins.
    for _ in 0..61 {
        rig.tick(20.0);
    }
    assert_eq!(rig.engine.status(), FiringStatus::Heating);
}

#[test]
fn test_hold_entry_requires_both_bands() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    // 600 °C/h toward 25 °C: the setpoint arrives at the target after 30 s.
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(600.0, 25.0, 1),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    // Measurement already inside the +/-2 band, but the setpoint still lags:
    // no hold yet.
    for _ in 0..20 {
        rig.tick(24.0);
        assert_eq!(rig.engine.status(), FiringStatus::Heating);
    }

    // Once the ramped setpoint reaches the target, hold begins.
    for _ in 0..15 {
        rig.tick(24.5);
    }
    assert_eq!(rig.engine.status(), FiringStatus::Holding);

    // The one-minute hold then runs out and the single-segment firing
    // completes.
    for _ in 0..65 {
        rig.tick(24.8);
    }
    assert_eq!(rig.engine.status(), FiringStatus::Complete);
    assert!(rig.events.is_set(events::FIRING_COMPLETE));

    let records = rig.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, FiringOutcome::Complete);
    assert_eq!(records[0].error_code, FiringErrorCode::None);
}

#[test]
fn test_infinite_hold_only_advances_on_skip() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(600.0, 25.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    for _ in 0..40 {
        rig.tick(24.8);
    }
    assert_eq!(rig.engine.status(), FiringStatus::Holding);

    // A zero-minute hold never times out.
    for _ in 0..600 {
        rig.tick(24.9);
    }
    assert_eq!(rig.engine.status(), FiringStatus::Holding);

    rig.inbox.send(Command::SkipSegment).unwrap();
    rig.tick(24.9);
    assert_eq!(rig.engine.status(), FiringStatus::Complete);
}

#[test]
fn test_pause_freezes_segment_elapsed() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    for _ in 0..10 {
        rig.tick(21.0);
    }
    let before_pause = rig.progress.get().elapsed_seconds;

    rig.inbox.send(Command::Pause).unwrap();
    rig.tick(21.0);
    assert_eq!(rig.engine.status(), FiringStatus::Paused);
    assert_eq!(rig.duty.get(), 0.0);

    // A long pause must not advance the firing's elapsed accounting.
    for _ in 0..300 {
        rig.tick(21.0);
        assert_eq!(rig.duty.get(), 0.0);
    }

    rig.inbox.send(Command::Resume).unwrap();
    rig.tick(21.0);
    assert_eq!(rig.engine.status(), FiringStatus::Heating);

    let after_resume = rig.progress.get().elapsed_seconds;
    assert!(
        after_resume <= before_pause + 5,
        "pause leaked into elapsed time: {before_pause} -> {after_resume}"
    );
}

#[test]
fn test_stop_writes_aborted_record() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);
    for _ in 0..5 {
        rig.tick(22.0);
    }

    rig.inbox.send(Command::Stop).unwrap();
    rig.tick(22.0);

    assert_eq!(rig.engine.status(), FiringStatus::Idle);
    assert_eq!(rig.duty.get(), 0.0);
    let records = rig.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, FiringOutcome::Aborted);
    assert!(!rig.events.is_set(events::FIRING_COMPLETE));
}

#[test]
fn test_emergency_latch_ends_firing_with_error_record() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);
    for _ in 0..5 {
        rig.tick(30.0);
    }

    // Supervisor-side detection latches the stop; the engine observes it on
    // its next tick.
    rig.error.set(FiringErrorCode::OverTemp);
    rig.events.set(events::EMERGENCY_STOP);
    rig.tick(30.0);

    assert_eq!(rig.engine.status(), FiringStatus::Error);
    assert_eq!(rig.duty.get(), 0.0);
    let records = rig.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, FiringOutcome::Error);
    assert_eq!(records[0].error_code, FiringErrorCode::OverTemp);
    assert!(!rig.events.is_set(events::FIRING_COMPLETE));

    // While the latch holds, a new start is rejected.
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(30.0);
    assert_eq!(rig.engine.status(), FiringStatus::Error);
    assert_eq!(rig.records().len(), 1);
}

#[test]
fn test_kiln_not_rising_trips_at_guard_boundary() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    // 15 minutes of heating with only 2 degrees of gain.
    for tick in 0..(15 * 60 + 1) {
        let temp = 20.0 + 2.0 * (tick as f32 / (15.0 * 60.0));
        rig.tick(temp);
        if rig.engine.status() == FiringStatus::Error {
            break;
        }
    }

    assert_eq!(rig.engine.status(), FiringStatus::Error);
    assert_eq!(rig.error.get(), FiringErrorCode::NotRising);
    assert!(rig.events.is_set(events::EMERGENCY_STOP));
    let records = rig.records();
    assert_eq!(records[0].error_code, FiringErrorCode::NotRising);
}

#[test]
fn test_runaway_trips_after_grace() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    // Programmed ramp 60 °C/h, observed about 200 °C/h.
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(60.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    let rate_c_per_s = 200.0 / 3600.0;
    let mut tripped_at = None;
    for tick in 0..(10 * 60) {
        let temp = 20.0 + rate_c_per_s * tick as f32;
        rig.tick(temp);
        if rig.engine.status() == FiringStatus::Error {
            tripped_at = Some(tick);
            break;
        }
    }

    let tripped_at = tripped_at.expect("runaway not detected");
    // Inside the 300 s grace window nothing trips; shortly after it does.
    assert!(tripped_at >= 299, "tripped during grace at {tripped_at}");
    assert!(tripped_at < 420, "tripped too late at {tripped_at}");
    assert_eq!(rig.error.get(), FiringErrorCode::Runaway);
}

#[test]
fn test_autotune_setpoint_above_limit_is_rejected() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::AutotuneStart {
            setpoint_c: 1500.0,
            hysteresis_c: 5.0,
        })
        .unwrap();
    rig.tick(20.0);
    assert_eq!(rig.engine.status(), FiringStatus::Idle);

    rig.inbox
        .send(Command::AutotuneStart {
            setpoint_c: 500.0,
            hysteresis_c: 5.0,
        })
        .unwrap();
    rig.tick(20.0);
    assert_eq!(rig.engine.status(), FiringStatus::Autotune);

    rig.inbox.send(Command::AutotuneStop).unwrap();
    rig.tick(20.0);
    assert_eq!(rig.engine.status(), FiringStatus::Idle);
}

#[test]
fn test_trace_samples_once_per_minute() {
    let mut rig = Rig::new();
    rig.set_temp(20.0);
    rig.inbox
        .send(Command::Start {
            profile: single_segment_profile(100.0, 500.0, 0),
            delay_minutes: 0,
        })
        .unwrap();
    rig.tick(20.0);

    for _ in 0..185 {
        rig.tick(25.0);
    }

    let traces = rig.persisted.0.lock().traces.clone();
    assert_eq!(traces.len(), 3);
    assert_eq!(traces[0].1, 60);
    assert_eq!(traces[1].1, 120);
    assert_eq!(traces[2].1, 180);
}
