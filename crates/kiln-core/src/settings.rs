//! User-adjustable kiln settings.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Absolute hardware ceiling. [`KilnSettings::set_max_safe_temp_c`] clamps
/// below this and the safety supervisor enforces it independently of whatever
/// is stored.
pub const HARDWARE_CEILING_C: f32 = 1400.0;

/// Lowest accepted safe-temperature limit.
pub const MIN_SAFE_TEMP_C: f32 = 100.0;

/// Temperature unit used for display only; the core always works in °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TempUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    /// The single-byte ASCII representation used in storage ('C' / 'F').
    pub fn as_ascii(self) -> u8 {
        match self {
            TempUnit::Celsius => b'C',
            TempUnit::Fahrenheit => b'F',
        }
    }

    pub fn from_ascii(byte: u8) -> Self {
        match byte {
            b'F' => TempUnit::Fahrenheit,
            _ => TempUnit::Celsius,
        }
    }
}

/// All user-adjustable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KilnSettings {
    pub unit: TempUnit,
    /// Hard over-temperature limit in °C, clamped to
    /// `[MIN_SAFE_TEMP_C, HARDWARE_CEILING_C]` on write.
    max_safe_temp_c: f32,
    pub alarm_enabled: bool,
    pub auto_shutdown_enabled: bool,
    pub notifications_enabled: bool,
    /// Calibration offset added to the raw thermocouple temperature.
    pub tc_offset_c: f32,
    pub webhook_url: String,
    /// Write-only: accepted on writes, never serialized back to observers.
    #[serde(skip_serializing)]
    #[serde(default)]
    pub api_token: String,
    pub element_watts: i32,
    pub electricity_cost_per_kwh: f32,
}

impl Default for KilnSettings {
    fn default() -> Self {
        Self {
            unit: TempUnit::Celsius,
            max_safe_temp_c: 1320.0,
            alarm_enabled: true,
            auto_shutdown_enabled: true,
            notifications_enabled: false,
            tc_offset_c: 0.0,
            webhook_url: String::new(),
            api_token: String::new(),
            element_watts: 9600,
            electricity_cost_per_kwh: 0.30,
        }
    }
}

impl KilnSettings {
    pub fn max_safe_temp_c(&self) -> f32 {
        self.max_safe_temp_c
    }

    /// Stores a new safe-temperature limit, clamped to the accepted range.
    pub fn set_max_safe_temp_c(&mut self, value_c: f32) {
        self.max_safe_temp_c = if value_c.is_finite() {
            value_c.clamp(MIN_SAFE_TEMP_C, HARDWARE_CEILING_C)
        } else {
            HARDWARE_CEILING_C
        };
    }
}

/// Settings shared between tasks; copied out under a short lock.
pub type SharedSettings = Arc<Mutex<KilnSettings>>;

pub fn shared(settings: KilnSettings) -> SharedSettings {
    Arc::new(Mutex::new(settings))
}
