//! Settings storage: one scalar entry per value.
//!
//! Floats are stored as scaled integers (offset × 100, cost × 1000) so the
//! flash contents stay portable across float formats.

use kiln_core::settings::{KilnSettings, TempUnit};

use crate::errors::StoreError;
use crate::fs::TraceFs;
use crate::kv::KvStore;
use crate::Store;

const NS: &str = "settings";

impl<K: KvStore, F: TraceFs> Store<K, F> {
    /// Loads settings, falling back to defaults for any missing value.
    pub fn load_settings(&self) -> Result<KilnSettings, StoreError> {
        let mut settings = KilnSettings::default();

        if let Some(unit) = self.kv.get_u8(NS, "unit")? {
            settings.unit = TempUnit::from_ascii(unit);
        }
        if let Some(max_safe) = self.kv.get_i32(NS, "max_safe_temp")? {
            settings.set_max_safe_temp_c(max_safe as f32);
        }
        if let Some(alarm) = self.kv.get_u8(NS, "alarm")? {
            settings.alarm_enabled = alarm != 0;
        }
        if let Some(shutdown) = self.kv.get_u8(NS, "auto_shutdown")? {
            settings.auto_shutdown_enabled = shutdown != 0;
        }
        if let Some(notify) = self.kv.get_u8(NS, "notify")? {
            settings.notifications_enabled = notify != 0;
        }
        if let Some(offset) = self.kv.get_i32(NS, "tc_offset")? {
            settings.tc_offset_c = offset as f32 / 100.0;
        }
        if let Some(url) = self.kv.get_string(NS, "webhook_url")? {
            settings.webhook_url = url;
        }
        if let Some(token) = self.kv.get_string(NS, "api_token")? {
            settings.api_token = token;
        }
        if let Some(watts) = self.kv.get_i32(NS, "element_watts")? {
            settings.element_watts = watts;
        }
        if let Some(cost) = self.kv.get_i32(NS, "energy_cost")? {
            settings.electricity_cost_per_kwh = cost as f32 / 1000.0;
        }

        Ok(settings)
    }

    pub fn save_settings(&mut self, settings: &KilnSettings) -> Result<(), StoreError> {
        self.kv.put_u8(NS, "unit", settings.unit.as_ascii())?;
        self.kv
            .put_i32(NS, "max_safe_temp", settings.max_safe_temp_c() as i32)?;
        self.kv.put_u8(NS, "alarm", settings.alarm_enabled as u8)?;
        self.kv
            .put_u8(NS, "auto_shutdown", settings.auto_shutdown_enabled as u8)?;
        self.kv
            .put_u8(NS, "notify", settings.notifications_enabled as u8)?;
        self.kv.put_i32(
            NS,
            "tc_offset",
            (settings.tc_offset_c * 100.0).round() as i32,
        )?;
        self.kv
            .put_string(NS, "webhook_url", &settings.webhook_url)?;
        // The token is only rewritten when the caller supplied one; an empty
        // value keeps whatever is stored.
        if !settings.api_token.is_empty() {
            self.kv.put_string(NS, "api_token", &settings.api_token)?;
        }
        self.kv
            .put_i32(NS, "element_watts", settings.element_watts)?;
        self.kv.put_i32(
            NS,
            "energy_cost",
            (settings.electricity_cost_per_kwh * 1000.0).round() as i32,
        )?;
        Ok(())
    }
}
