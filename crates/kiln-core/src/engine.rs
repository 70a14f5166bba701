//! The firing engine: a 1 Hz state machine that walks a firing profile.
//!
//! The engine owns the active profile, the per-segment timers, and the PID
//! instance, and is the sole producer of setpoints. It publishes the desired
//! element duty through an [`SsrCommand`] handle and observes the
//! supervisor's emergency latch through the shared event group; the two
//! never call each other.
//!
//! Commands arrive through a bounded inbox and are drained at the start of
//! every tick. Stopping a firing is synchronous from the caller's
//! perspective: once `Stop` is accepted, the next tick drives the duty to
//! zero and writes the history record.

use std::sync::Arc;

use core::sync::atomic::{AtomicU32, Ordering};
use thermal::autotune::{AutotunePhase, RelayAutotune};
use thermal::pid::{Pid, PidGains};
use tracing::{error, info, warn};

use crate::command::{Command, CommandInbox};
use crate::error::{ErrorCell, FiringErrorCode};
use crate::events::{self, EventGroup};
use crate::history::{FiringOutcome, HistoryRecord};
use crate::persist::Persistence;
use crate::profile::FiringProfile;
use crate::progress::{FiringProgress, FiringStatus, ProgressCell};
use crate::safety::SsrCommand;
use crate::sensor::ReadingCell;
use crate::settings::SharedSettings;

/// Engine cadence.
pub const ENGINE_PERIOD_MS: u64 = 1000;

/// A segment enters hold once the measurement is inside this band around the
/// target...
const HOLD_TEMP_BAND_C: f32 = 2.0;
/// ...and the ramped setpoint has effectively arrived as well.
const HOLD_SETPOINT_BAND_C: f32 = 0.5;

/// Kiln-not-rising guard: require this much gain per guard window.
const RISE_WINDOW_US: u64 = 15 * 60 * 1_000_000;
const RISE_MIN_C: f32 = 10.0;

/// Runaway guard parameters: after the grace period, trip when the observed
/// rate exceeds both twice the programmed ramp and an absolute floor.
const RUNAWAY_GRACE_S: f32 = 300.0;
const RUNAWAY_MIN_PROGRAMMED_C_PER_H: f32 = 0.1;
const RUNAWAY_FACTOR: f32 = 2.0;
const RUNAWAY_FLOOR_C_PER_H: f32 = 50.0;

/// Element-on seconds are flushed to storage at most this often.
const ELEMENT_FLUSH_US: u64 = 5 * 60 * 1_000_000;

/// Trace sampling interval.
const TRACE_INTERVAL_US: u64 = 60 * 1_000_000;

/// Lifetime element-on counter in seconds, shared with observers.
#[derive(Debug, Default)]
pub struct ElementCounter(AtomicU32);

impl ElementCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn store(&self, seconds: u32) {
        self.0.store(seconds, Ordering::SeqCst);
    }

    fn add(&self, seconds: u32) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

/// Shared cells the engine reads and writes.
pub struct EngineHandles {
    pub inbox: Arc<CommandInbox>,
    pub reading: Arc<ReadingCell>,
    pub settings: SharedSettings,
    pub ssr: SsrCommand,
    pub events: Arc<EventGroup>,
    pub error: Arc<ErrorCell>,
    pub progress: Arc<ProgressCell>,
    pub element_seconds: Arc<ElementCounter>,
}

/// Book-keeping for the firing in progress.
struct ActiveFiring {
    profile: FiringProfile,
    firing_id: u32,
    started_at_unix: u64,
    /// Set while a delayed start is pending; the firing is exposed as `Idle`
    /// with the active flag until the deadline passes.
    delay_deadline_unix: Option<u64>,
    started_us: u64,
    segment: usize,
    segment_start_us: u64,
    segment_start_temp_c: f32,
    holding: bool,
    hold_start_us: u64,
    guard_start_us: u64,
    guard_start_temp_c: f32,
    peak_temp_c: f32,
    next_trace_us: u64,
    element_on_at_start_s: u32,
    paused_at_us: Option<u64>,
}

/// The firing state machine.
pub struct FiringEngine<P: Persistence> {
    inbox: Arc<CommandInbox>,
    reading: Arc<ReadingCell>,
    settings: SharedSettings,
    ssr: SsrCommand,
    events: Arc<EventGroup>,
    error: Arc<ErrorCell>,
    progress: Arc<ProgressCell>,
    element_seconds: Arc<ElementCounter>,
    persist: P,

    pid: Pid<f32>,
    status: FiringStatus,
    firing: Option<ActiveFiring>,
    autotune: Option<RelayAutotune>,
    last_tick_us: Option<u64>,
    element_acc_s: f64,
    element_dirty: bool,
    element_flushed_at_us: u64,
}

impl<P: Persistence> FiringEngine<P> {
    /// Creates the engine, loading persisted gains and the element-hours
    /// counter.
    pub fn new(handles: EngineHandles, mut persist: P) -> Self {
        let gains = persist.load_gains();
        handles.element_seconds.store(persist.load_element_seconds());

        Self {
            inbox: handles.inbox,
            reading: handles.reading,
            settings: handles.settings,
            ssr: handles.ssr,
            events: handles.events,
            error: handles.error,
            progress: handles.progress,
            element_seconds: handles.element_seconds,
            persist,
            pid: Pid::from_gains(gains),
            status: FiringStatus::Idle,
            firing: None,
            autotune: None,
            last_tick_us: None,
            element_acc_s: 0.0,
            element_dirty: false,
            element_flushed_at_us: 0,
        }
    }

    pub fn status(&self) -> FiringStatus {
        self.status
    }

    pub fn pid_gains(&self) -> PidGains {
        PidGains {
            kp: self.pid.kp,
            ki: self.pid.ki,
            kd: self.pid.kd,
        }
    }

    /// One engine period.
    pub fn tick(&mut self, now_us: u64, wall_unix_s: u64) {
        while let Some(command) = self.inbox.try_recv() {
            self.handle_command(command, now_us, wall_unix_s);
        }

        // A pending delayed start begins once the wall clock passes its
        // deadline.
        let delay_expired = matches!(
            self.firing.as_ref().and_then(|f| f.delay_deadline_unix),
            Some(deadline) if wall_unix_s >= deadline
        );
        if delay_expired {
            self.begin_firing(now_us, wall_unix_s);
        }

        let temp_c = self.measured_temp_c();
        let dt_s = match self.last_tick_us {
            Some(prev) => now_us.saturating_sub(prev) as f32 / 1e6,
            None => 0.0,
        };
        self.last_tick_us = Some(now_us);

        if self.events.is_set(events::EMERGENCY_STOP) {
            if self.firing.is_some() {
                let code = match self.error.get() {
                    FiringErrorCode::None => FiringErrorCode::EmergencyStop,
                    code => code,
                };
                self.finalize(FiringOutcome::Error, code, now_us, temp_c);
            }
            self.status = FiringStatus::Error;
            self.ssr.set_duty(0.0);
            self.publish_progress(temp_c, 0.0, now_us);
            return;
        }

        match self.status {
            FiringStatus::Idle
            | FiringStatus::Complete
            | FiringStatus::Error
            | FiringStatus::Paused => {
                self.ssr.set_duty(0.0);
                self.publish_progress(temp_c, 0.0, now_us);
            }
            FiringStatus::Autotune => {
                self.autotune_step(temp_c, dt_s, now_us);
                self.publish_progress(temp_c, 0.0, now_us);
            }
            FiringStatus::Heating | FiringStatus::Cooling | FiringStatus::Holding => {
                self.segment_step(temp_c, dt_s, now_us);
            }
        }
    }

    /// Latest sample with the calibration offset applied.
    fn measured_temp_c(&self) -> f32 {
        let raw = self.reading.get();
        raw.temperature_c + self.settings.lock().tc_offset_c
    }

    fn handle_command(&mut self, command: Command, now_us: u64, wall_unix_s: u64) {
        match command {
            Command::Start {
                profile,
                delay_minutes,
            } => self.cmd_start(profile, delay_minutes, now_us, wall_unix_s),
            Command::Stop => self.cmd_stop(now_us),
            Command::Pause => self.cmd_pause(now_us),
            Command::Resume => self.cmd_resume(now_us),
            Command::SkipSegment => self.cmd_skip_segment(now_us),
            Command::AutotuneStart {
                setpoint_c,
                hysteresis_c,
            } => self.cmd_autotune_start(setpoint_c, hysteresis_c),
            Command::AutotuneStop => self.cmd_autotune_stop(),
        }
    }

    fn cmd_start(
        &mut self,
        profile: FiringProfile,
        delay_minutes: u32,
        now_us: u64,
        wall_unix_s: u64,
    ) {
        if self.events.is_set(events::EMERGENCY_STOP) {
            warn!("start rejected: emergency latch is set");
            return;
        }
        if self.firing.is_some() || self.status == FiringStatus::Autotune {
            warn!("start ignored: a firing or auto-tune is already active");
            return;
        }
        if let Err(err) = profile.validate() {
            warn!(%err, profile = %profile.id, "start rejected: invalid profile");
            return;
        }

        self.error.clear();
        self.events.clear(events::FIRING_COMPLETE);
        let firing_id = self.persist.next_firing_id();
        info!(
            profile = %profile.id,
            firing_id,
            delay_minutes,
            "firing queued"
        );

        self.firing = Some(ActiveFiring {
            firing_id,
            started_at_unix: wall_unix_s,
            delay_deadline_unix: (delay_minutes > 0)
                .then(|| wall_unix_s + u64::from(delay_minutes) * 60),
            started_us: now_us,
            segment: 0,
            segment_start_us: now_us,
            segment_start_temp_c: 0.0,
            holding: false,
            hold_start_us: now_us,
            guard_start_us: now_us,
            guard_start_temp_c: 0.0,
            peak_temp_c: 0.0,
            next_trace_us: now_us + TRACE_INTERVAL_US,
            element_on_at_start_s: self.element_seconds.get(),
            paused_at_us: None,
            profile,
        });
        self.status = FiringStatus::Idle;

        if delay_minutes == 0 {
            self.begin_firing(now_us, wall_unix_s);
        }
    }

    /// Transitions a queued firing into its first segment.
    fn begin_firing(&mut self, now_us: u64, wall_unix_s: u64) {
        let temp_c = self.measured_temp_c();
        let Some(firing) = self.firing.as_mut() else {
            return;
        };

        firing.delay_deadline_unix = None;
        firing.started_at_unix = wall_unix_s;
        firing.started_us = now_us;
        firing.segment = 0;
        firing.segment_start_us = now_us;
        firing.segment_start_temp_c = temp_c;
        firing.holding = false;
        firing.guard_start_us = now_us;
        firing.guard_start_temp_c = temp_c;
        firing.peak_temp_c = temp_c;
        firing.next_trace_us = now_us + TRACE_INTERVAL_US;

        let ramp = firing.profile.segments[0].ramp_rate_c_per_h;
        self.status = if ramp >= 0.0 {
            FiringStatus::Heating
        } else {
            FiringStatus::Cooling
        };
        self.pid.reset();
        info!(start_temp_c = temp_c, "firing started");
    }

    fn cmd_stop(&mut self, now_us: u64) {
        if self.status == FiringStatus::Autotune {
            self.cmd_autotune_stop();
            return;
        }
        if self.firing.is_some() {
            let temp_c = self.measured_temp_c();
            self.finalize(FiringOutcome::Aborted, FiringErrorCode::None, now_us, temp_c);
            info!("firing aborted by command");
        }
    }

    fn cmd_pause(&mut self, now_us: u64) {
        if !matches!(
            self.status,
            FiringStatus::Heating | FiringStatus::Cooling | FiringStatus::Holding
        ) {
            return;
        }
        if let Some(firing) = self.firing.as_mut() {
            firing.paused_at_us = Some(now_us);
            self.ssr.set_duty(0.0);
            self.status = FiringStatus::Paused;
            info!("firing paused");
        }
    }

    fn cmd_resume(&mut self, now_us: u64) {
        if self.status != FiringStatus::Paused {
            return;
        }
        if let Some(firing) = self.firing.as_mut() {
            // Paused time does not count toward segment or hold progress:
            // shift every reference timestamp forward by the pause duration.
            let paused_at = firing.paused_at_us.take().unwrap_or(now_us);
            let pause_us = now_us.saturating_sub(paused_at);
            firing.started_us += pause_us;
            firing.segment_start_us += pause_us;
            firing.hold_start_us += pause_us;
            firing.guard_start_us += pause_us;
            firing.next_trace_us += pause_us;

            let ramp = firing.profile.segments[firing.segment].ramp_rate_c_per_h;
            self.status = if firing.holding {
                FiringStatus::Holding
            } else if ramp >= 0.0 {
                FiringStatus::Heating
            } else {
                FiringStatus::Cooling
            };
            info!(paused_s = pause_us / 1_000_000, "firing resumed");
        }
    }

    fn cmd_skip_segment(&mut self, now_us: u64) {
        if !matches!(
            self.status,
            FiringStatus::Heating | FiringStatus::Cooling | FiringStatus::Holding
        ) {
            return;
        }
        let temp_c = self.measured_temp_c();
        info!("segment skipped by command");
        self.advance_segment(now_us, temp_c);
    }

    fn cmd_autotune_start(&mut self, setpoint_c: f32, hysteresis_c: f32) {
        if self.events.is_set(events::EMERGENCY_STOP) {
            warn!("auto-tune rejected: emergency latch is set");
            return;
        }
        if self.firing.is_some() || self.status == FiringStatus::Autotune {
            warn!("auto-tune rejected: controller is busy");
            return;
        }
        let max_safe_c = self.settings.lock().max_safe_temp_c();
        if setpoint_c > max_safe_c {
            warn!(
                setpoint_c,
                max_safe_c, "auto-tune rejected: setpoint above the safe limit"
            );
            return;
        }

        self.error.clear();
        self.autotune = Some(RelayAutotune::new(setpoint_c, hysteresis_c));
        self.status = FiringStatus::Autotune;
        info!(setpoint_c, hysteresis_c, "auto-tune started");
    }

    fn cmd_autotune_stop(&mut self) {
        if self.status == FiringStatus::Autotune {
            self.autotune = None;
            self.status = FiringStatus::Idle;
            self.ssr.set_duty(0.0);
            info!("auto-tune cancelled");
        }
    }

    /// One auto-tune step: relay output, then completion/failure handling.
    fn autotune_step(&mut self, temp_c: f32, dt_s: f32, now_us: u64) {
        let Some(tune) = self.autotune.as_mut() else {
            self.status = FiringStatus::Idle;
            return;
        };

        let duty = tune.update(temp_c, now_us);
        match tune.phase() {
            AutotunePhase::Complete => {
                let gains = tune.gains().unwrap_or_default();
                self.autotune = None;
                if let Err(err) = self.persist.save_gains(gains) {
                    warn!(%err, "failed to persist tuned gains");
                }
                self.pid = Pid::from_gains(gains);
                self.status = FiringStatus::Idle;
                self.ssr.set_duty(0.0);
                info!(
                    kp = gains.kp,
                    ki = gains.ki,
                    kd = gains.kd,
                    "auto-tune complete"
                );
            }
            AutotunePhase::Failed => {
                self.autotune = None;
                self.error.set_if_none(FiringErrorCode::AutotuneFailed);
                self.status = FiringStatus::Idle;
                self.ssr.set_duty(0.0);
                warn!("auto-tune failed; gains unchanged");
            }
            _ => {
                self.ssr.set_duty(duty);
                self.accumulate_element(duty, dt_s, now_us);
            }
        }
    }

    /// Ramp/hold logic for the active segment.
    fn segment_step(&mut self, temp_c: f32, dt_s: f32, now_us: u64) {
        let (ramp, target_c, hold_minutes, segment_elapsed_s) = {
            let firing = self.firing.as_ref().expect("segment step without firing");
            let segment = &firing.profile.segments[firing.segment];
            (
                segment.ramp_rate_c_per_h,
                segment.target_temp_c,
                segment.hold_minutes,
                now_us.saturating_sub(firing.segment_start_us) as f32 / 1e6,
            )
        };

        {
            let firing = self.firing.as_mut().expect("segment step without firing");
            firing.peak_temp_c = firing.peak_temp_c.max(temp_c);
        }

        if self.status == FiringStatus::Heating {
            // Kiln-not-rising guard: each 15-minute window must gain at
            // least 10 degrees while a positive ramp is programmed.
            if ramp > 0.0 {
                let firing = self.firing.as_mut().expect("segment step without firing");
                if now_us.saturating_sub(firing.guard_start_us) >= RISE_WINDOW_US {
                    let gained_c = temp_c - firing.guard_start_temp_c;
                    if gained_c < RISE_MIN_C {
                        error!(gained_c, "kiln is not rising");
                        self.trip(FiringErrorCode::NotRising, now_us, temp_c);
                        return;
                    }
                    firing.guard_start_us = now_us;
                    firing.guard_start_temp_c = temp_c;
                }
            }

            // Runaway guard, evaluated after an in-segment grace period so
            // the observed rate is meaningful.
            if segment_elapsed_s > RUNAWAY_GRACE_S && ramp.abs() > RUNAWAY_MIN_PROGRAMMED_C_PER_H {
                let start_temp_c = self
                    .firing
                    .as_ref()
                    .expect("segment step without firing")
                    .segment_start_temp_c;
                let observed_c_per_h = (temp_c - start_temp_c) / (segment_elapsed_s / 3600.0);
                if observed_c_per_h > RUNAWAY_FACTOR * ramp.abs()
                    && observed_c_per_h > RUNAWAY_FLOOR_C_PER_H
                {
                    error!(
                        observed_c_per_h,
                        programmed_c_per_h = ramp,
                        "runaway heating"
                    );
                    self.trip(FiringErrorCode::Runaway, now_us, temp_c);
                    return;
                }
            }
        }

        // Dynamic setpoint along the ramp, clamped so it never overshoots
        // the target on the far side.
        let start_temp_c = self
            .firing
            .as_ref()
            .expect("segment step without firing")
            .segment_start_temp_c;
        let mut setpoint_c = start_temp_c + ramp / 3600.0 * segment_elapsed_s;
        setpoint_c = if ramp >= 0.0 {
            setpoint_c.min(target_c)
        } else {
            setpoint_c.max(target_c)
        };

        let duty = self.pid.update(setpoint_c, temp_c, dt_s);
        self.ssr.set_duty(duty);
        self.accumulate_element(duty, dt_s, now_us);

        // Minute-resolution history trace.
        let trace_due = {
            let firing = self.firing.as_ref().expect("segment step without firing");
            now_us >= firing.next_trace_us
        };
        if trace_due {
            let (firing_id, elapsed_s) = {
                let firing = self.firing.as_mut().expect("segment step without firing");
                firing.next_trace_us += TRACE_INTERVAL_US;
                (
                    firing.firing_id,
                    (now_us.saturating_sub(firing.started_us) / 1_000_000) as u32,
                )
            };
            if let Err(err) = self.persist.append_trace(firing_id, elapsed_s, temp_c) {
                warn!(%err, "failed to append trace sample");
            }
        }

        // Hold entry: both the measurement and the setpoint must have
        // arrived at the target.
        {
            let firing = self.firing.as_mut().expect("segment step without firing");
            if !firing.holding
                && (temp_c - target_c).abs() < HOLD_TEMP_BAND_C
                && (setpoint_c - target_c).abs() < HOLD_SETPOINT_BAND_C
            {
                firing.holding = true;
                firing.hold_start_us = now_us;
                self.status = FiringStatus::Holding;
                info!(segment = firing.segment, target_c, "entering hold");
            }
        }

        // Hold exit: a zero-minute hold is indefinite and only a skip
        // command advances it.
        let hold_done = {
            let firing = self.firing.as_ref().expect("segment step without firing");
            firing.holding
                && hold_minutes > 0
                && now_us.saturating_sub(firing.hold_start_us)
                    >= u64::from(hold_minutes) * 60_000_000
        };
        if hold_done {
            self.advance_segment(now_us, temp_c);
        }

        self.publish_progress(temp_c, setpoint_c, now_us);
    }

    /// Engine-detected safety violation: latch the emergency stop and end
    /// the firing with an error record. The supervisor observes the latch
    /// within one of its periods and holds the SSR low.
    fn trip(&mut self, code: FiringErrorCode, now_us: u64, temp_c: f32) {
        self.error.set_if_none(code);
        self.events.set(events::EMERGENCY_STOP);
        self.ssr.set_duty(0.0);
        self.finalize(FiringOutcome::Error, code, now_us, temp_c);
        self.publish_progress(temp_c, 0.0, now_us);
    }

    /// Moves to the next segment, or finalizes the firing after the last.
    fn advance_segment(&mut self, now_us: u64, temp_c: f32) {
        let done = {
            let firing = self.firing.as_mut().expect("advance without firing");
            firing.segment += 1;
            firing.segment >= firing.profile.segments.len()
        };
        if done {
            self.finalize(FiringOutcome::Complete, FiringErrorCode::None, now_us, temp_c);
            return;
        }

        let firing = self.firing.as_mut().expect("advance without firing");
        firing.segment_start_us = now_us;
        firing.segment_start_temp_c = temp_c;
        firing.holding = false;
        firing.guard_start_us = now_us;
        firing.guard_start_temp_c = temp_c;

        let ramp = firing.profile.segments[firing.segment].ramp_rate_c_per_h;
        self.status = if ramp >= 0.0 {
            FiringStatus::Heating
        } else {
            FiringStatus::Cooling
        };
        info!(segment = firing.segment, "segment advanced");
    }

    /// Ends the active firing: duty to zero, element-hours flushed, history
    /// written, completion event on success.
    fn finalize(
        &mut self,
        outcome: FiringOutcome,
        code: FiringErrorCode,
        now_us: u64,
        temp_c: f32,
    ) {
        let Some(firing) = self.firing.take() else {
            return;
        };

        self.ssr.set_duty(0.0);
        self.flush_element_seconds(now_us, true);

        let total_seconds = if firing.delay_deadline_unix.is_some() {
            0
        } else {
            let effective_now_us = firing.paused_at_us.unwrap_or(now_us);
            (effective_now_us.saturating_sub(firing.started_us) / 1_000_000) as u32
        };
        let record = HistoryRecord {
            id: firing.firing_id,
            started_at_unix: firing.started_at_unix,
            profile_id: firing.profile.id.clone(),
            profile_name: firing.profile.name.clone(),
            peak_temp_c: firing.peak_temp_c.max(temp_c),
            total_seconds,
            outcome,
            error_code: code,
            element_on_seconds: self
                .element_seconds
                .get()
                .saturating_sub(firing.element_on_at_start_s),
        };
        if let Err(err) = self.persist.record_firing(&record) {
            warn!(%err, "failed to record firing history");
        }

        self.status = match outcome {
            FiringOutcome::Complete => FiringStatus::Complete,
            FiringOutcome::Error => FiringStatus::Error,
            FiringOutcome::Aborted => FiringStatus::Idle,
        };
        if outcome == FiringOutcome::Complete {
            self.events.set(events::FIRING_COMPLETE);
            info!(
                firing_id = record.id,
                peak_temp_c = record.peak_temp_c,
                total_seconds,
                "firing complete"
            );
        }
        self.pid.reset();
    }

    /// Accumulates element-on time while the duty is non-zero and flushes
    /// the counter to storage on the flush interval.
    fn accumulate_element(&mut self, duty: f32, dt_s: f32, now_us: u64) {
        if duty > 0.0 && dt_s > 0.0 {
            self.element_acc_s += f64::from(dt_s);
            while self.element_acc_s >= 1.0 {
                self.element_acc_s -= 1.0;
                self.element_seconds.add(1);
                self.element_dirty = true;
            }
        }
        if self.element_dirty
            && now_us.saturating_sub(self.element_flushed_at_us) >= ELEMENT_FLUSH_US
        {
            self.flush_element_seconds(now_us, false);
        }
    }

    fn flush_element_seconds(&mut self, now_us: u64, force: bool) {
        if !self.element_dirty && !force {
            return;
        }
        if let Err(err) = self.persist.save_element_seconds(self.element_seconds.get()) {
            warn!(%err, "failed to persist element-on seconds");
        }
        self.element_dirty = false;
        self.element_flushed_at_us = now_us;
    }

    fn publish_progress(&self, temp_c: f32, setpoint_c: f32, now_us: u64) {
        let progress = match &self.firing {
            Some(firing) => {
                // While paused, elapsed time holds at the pause instant.
                let effective_now_us = firing.paused_at_us.unwrap_or(now_us);
                let elapsed_seconds = if firing.delay_deadline_unix.is_some() {
                    0
                } else {
                    (effective_now_us.saturating_sub(firing.started_us) / 1_000_000) as u32
                };
                let estimate_s = firing.profile.estimated_duration_minutes.saturating_mul(60);
                FiringProgress {
                    active: true,
                    profile_id: firing.profile.id.clone(),
                    current_temp_c: temp_c,
                    target_temp_c: setpoint_c,
                    current_segment: firing.segment as u32,
                    total_segments: firing.profile.segments.len() as u32,
                    elapsed_seconds,
                    estimated_remaining_seconds: estimate_s.saturating_sub(elapsed_seconds),
                    status: self.status,
                }
            }
            None => FiringProgress {
                current_temp_c: temp_c,
                status: self.status,
                ..FiringProgress::default()
            },
        };
        self.progress.publish(progress);
    }
}
