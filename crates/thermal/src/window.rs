//! Time-proportional SSR output.
//!
//! A solid-state relay switching a mains heating element cannot be PWM'd at
//! kHz rates; instead a duty cycle is spread over a multi-second window. The
//! relay is on for the leading `duty` fraction of each window and off for the
//! remainder, which keeps switching slow and lets the SSR commutate on mains
//! zero crossings.

/// Default window length: 2000 ms.
pub const DEFAULT_WINDOW_US: u64 = 2_000_000;

/// Translates a duty cycle in `[0, 1]` into on/off levels over a repeating
/// time window.
#[derive(Debug, Clone, Copy)]
pub struct TimeProportionalWindow {
    period_us: u64,
    start_us: u64,
}

impl TimeProportionalWindow {
    /// Creates a window of the given period. The first window starts at the
    /// first call to [`TimeProportionalWindow::level`].
    pub fn new(period_us: u64) -> Self {
        Self {
            period_us,
            start_us: 0,
        }
    }

    /// Restarts the window at `now_us`.
    pub fn reset(&mut self, now_us: u64) {
        self.start_us = now_us;
    }

    /// Returns the output level for `duty` at time `now_us`.
    ///
    /// The level is high while the elapsed time within the current window is
    /// less than `duty * period`. When a window is exceeded it restarts at
    /// the current instant.
    pub fn level(&mut self, duty: f32, now_us: u64) -> bool {
        if now_us.saturating_sub(self.start_us) >= self.period_us {
            self.start_us = now_us;
        }

        let duty = duty.clamp(0.0, 1.0);
        let on_us = (duty * self.period_us as f32) as u64;
        now_us.saturating_sub(self.start_us) < on_us
    }
}

impl Default for TimeProportionalWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_US)
    }
}
