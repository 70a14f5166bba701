//! Kiln Configuration Loader
//!
//! Parses the controller's `kiln.cfg` INI file: kiln limits, pin
//! assignments for the embedded target, and the simulated plant parameters
//! used by the host build.

use anyhow::{Context, Result};
use configparser::ini::Ini;
use std::path::Path;

/// Represents the [kiln] section of the config.
#[derive(Debug, Clone)]
pub struct KilnLimitsConfig {
    pub max_safe_temp_c: Option<f32>,
    pub tc_offset_c: Option<f32>,
    pub element_watts: Option<i32>,
}

/// Represents the [pins] section: GPIO and SPI assignments for the embedded
/// target. The host build parses and reports them but drives the simulated
/// kiln instead.
#[derive(Debug, Clone)]
pub struct PinsConfig {
    pub ssr_gpio: u32,
    pub vent_gpio: u32,
    pub spi_sck: u32,
    pub spi_miso: u32,
    pub spi_cs: u32,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            ssr_gpio: 4,
            vent_gpio: 5,
            spi_sck: 18,
            spi_miso: 19,
            spi_cs: 15,
        }
    }
}

/// Represents the [sim] section: the plant model behind the host build.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub ambient_c: f32,
    pub tau_heat_s: f32,
    pub tau_cool_s: f32,
    pub element_max_c: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ambient_c: 20.0,
            tau_heat_s: 120.0,
            tau_cool_s: 300.0,
            element_max_c: 1800.0,
        }
    }
}

/// Holds the entire parsed controller configuration.
#[derive(Debug, Clone)]
pub struct KilnConfig {
    pub kiln: KilnLimitsConfig,
    pub pins: PinsConfig,
    pub sim: SimConfig,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            kiln: KilnLimitsConfig {
                max_safe_temp_c: None,
                tc_offset_c: None,
                element_watts: None,
            },
            pins: PinsConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl KilnConfig {
    /// Loads and parses the configuration file from the given path. A
    /// missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("Failed to load configuration file: {path:?}"))?;

        let mut parsed = Self::default();

        if let Ok(Some(value)) = config.getfloat("kiln", "max_safe_temp_c") {
            parsed.kiln.max_safe_temp_c = Some(value as f32);
        }
        if let Ok(Some(value)) = config.getfloat("kiln", "tc_offset_c") {
            parsed.kiln.tc_offset_c = Some(value as f32);
        }
        if let Ok(Some(value)) = config.getint("kiln", "element_watts") {
            parsed.kiln.element_watts = Some(value as i32);
        }

        let pin = |key: &str, default: u32| -> u32 {
            match config.getuint("pins", key) {
                Ok(Some(value)) => value as u32,
                _ => default,
            }
        };
        parsed.pins = PinsConfig {
            ssr_gpio: pin("ssr_gpio", 4),
            vent_gpio: pin("vent_gpio", 5),
            spi_sck: pin("spi_sck", 18),
            spi_miso: pin("spi_miso", 19),
            spi_cs: pin("spi_cs", 15),
        };

        let simf = |key: &str, default: f32| -> f32 {
            match config.getfloat("sim", key) {
                Ok(Some(value)) => value as f32,
                _ => default,
            }
        };
        parsed.sim = SimConfig {
            ambient_c: simf("ambient_c", 20.0),
            tau_heat_s: simf("tau_heat_s", 120.0),
            tau_cool_s: simf("tau_cool_s", 300.0),
            element_max_c: simf("element_max_c", 1800.0),
        };

        Ok(parsed)
    }
}
