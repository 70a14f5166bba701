//! A PID (Proportional-Integral-Derivative) controller.

use num_traits::{Float, Signed};

/// PID gains for the kiln element loop, as loaded from and stored to
/// non-volatile memory.
///
/// Gains are persisted as `i32` values scaled by 10 000 so that flash storage
/// never holds a floating-point representation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Storage scale factor for [`PidGains`].
pub const GAIN_SCALE: f32 = 10_000.0;

impl PidGains {
    /// Creates gains from the scaled-integer storage representation.
    pub fn from_scaled(kp: i32, ki: i32, kd: i32) -> Self {
        Self {
            kp: kp as f32 / GAIN_SCALE,
            ki: ki as f32 / GAIN_SCALE,
            kd: kd as f32 / GAIN_SCALE,
        }
    }

    /// Returns the scaled-integer storage representation `(kp, ki, kd)`.
    pub fn to_scaled(self) -> (i32, i32, i32) {
        (
            (self.kp * GAIN_SCALE) as i32,
            (self.ki * GAIN_SCALE) as i32,
            (self.kd * GAIN_SCALE) as i32,
        )
    }
}

impl Default for PidGains {
    /// Conservative defaults used when nothing has been persisted yet.
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 0.01,
            kd: 50.0,
        }
    }
}

/// A PID controller for regulating a system.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pid<F: Float + Signed> {
    /// Proportional gain.
    pub kp: F,
    /// Integral gain.
    pub ki: F,
    /// Derivative gain.
    pub kd: F,

    /// The lower bound of the controller's output.
    pub output_min: F,
    /// The upper bound of the controller's output.
    pub output_max: F,

    // Internal state
    integral: F,
    previous_error: F,
    first_update: bool,
}

impl<F: Float + Signed> Pid<F> {
    /// Creates a new PID controller.
    pub fn new(kp: F, ki: F, kd: F, output_min: F, output_max: F) -> Self {
        Self {
            kp,
            ki,
            kd,
            output_min,
            output_max,
            integral: F::zero(),
            previous_error: F::zero(),
            first_update: true,
        }
    }

    /// Updates the PID controller with a new measurement.
    ///
    /// # Arguments
    /// * `setpoint` - The target value for the system.
    /// * `measured` - The current measured value of the system.
    /// * `dt` - The time delta since the last update, in seconds.
    ///
    /// # Returns
    /// The calculated output value for the actuator, clamped to
    /// `[output_min, output_max]`. A non-positive `dt` returns `output_min`
    /// and leaves the internal state untouched.
    pub fn update(&mut self, setpoint: F, measured: F, dt: F) -> F {
        if dt <= F::zero() {
            return self.output_min;
        }

        let error = setpoint - measured;

        // Proportional term
        let p_term = self.kp * error;

        // Integral term
        self.integral = self.integral + error * dt;
        let i_term = self.ki * self.integral;

        // Derivative term, skipped on the first update since there is no
        // previous error to difference against.
        let d_term = if self.first_update {
            self.first_update = false;
            F::zero()
        } else {
            self.kd * ((error - self.previous_error) / dt)
        };
        self.previous_error = error;

        let unclamped = p_term + i_term + d_term;
        let output = unclamped.max(self.output_min).min(self.output_max);

        // Back-calculation anti-windup: when the output saturates, unwind the
        // integral contribution made this step iff the error is still pushing
        // further past the saturated bound.
        if unclamped > self.output_max && error > F::zero() {
            self.integral = self.integral - error * dt;
        } else if unclamped < self.output_min && error < F::zero() {
            self.integral = self.integral - error * dt;
        }

        output
    }

    /// Resets the internal state of the PID controller.
    pub fn reset(&mut self) {
        self.integral = F::zero();
        self.previous_error = F::zero();
        self.first_update = true;
    }

    /// Replaces the gains, resetting the accumulated state.
    pub fn set_gains(&mut self, kp: F, ki: F, kd: F) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self.reset();
    }
}

impl Pid<f32> {
    /// Creates a unit-output controller (`[0, 1]`) from persisted gains.
    pub fn from_gains(gains: PidGains) -> Self {
        Self::new(gains.kp, gains.ki, gains.kd, 0.0, 1.0)
    }
}
