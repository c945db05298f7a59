//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::{ChargeController, IrradianceSolar, LeadAcidBattery, NoisySolar};
use crate::sim::controller::{DebounceConfig, SimpleRelay};
use crate::sim::engine::{RelayChannel, RelayEngine};
use crate::sim::live::{LiveModel, LiveSimulation};
use crate::sim::switch::PowerSourceSwitch;
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Time grid and seed of the batch run.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Noisy panel signal of the batch run.
    #[serde(default)]
    pub solar: SolarConfig,
    /// MPPT and PWM converter parameters.
    #[serde(default)]
    pub charge_controller: ChargeControllerConfig,
    /// Simple and debounced relay parameters.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Battery/inverter source switch parameters.
    #[serde(default)]
    pub power_switch: PowerSwitchConfig,
    /// Battery bank of the live run.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Live run inputs and pacing.
    #[serde(default)]
    pub live: LiveConfig,
}

/// Time grid and seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated span in seconds (must be > 0).
    pub duration_s: f64,
    /// Number of grid points including both ends (must be >= 2).
    pub steps: usize,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_s: 10.0,
            steps: 100,
            seed: 42,
        }
    }
}

/// Panel signal: `base_w + amplitude_w * sin(t) + noise`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    pub base_w: f64,
    pub amplitude_w: f64,
    /// Gaussian noise standard deviation (W).
    pub noise_std_w: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            base_w: 50.0,
            amplitude_w: 30.0,
            noise_std_w: 20.0,
        }
    }
}

/// Charge controller parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargeControllerConfig {
    /// MPPT conversion efficiency (0..1.0].
    pub mppt_efficiency: f64,
    /// PWM efficiency before the low-light penalty (0..1.0].
    pub pwm_base_efficiency: f64,
    /// Output ceiling of both controllers (W).
    pub max_output_w: f64,
}

impl Default for ChargeControllerConfig {
    fn default() -> Self {
        Self {
            mppt_efficiency: 0.95,
            pwm_base_efficiency: 0.75,
            max_output_w: 100.0,
        }
    }
}

/// Relay thresholds and dwell times.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Debounced relay turns on at or above this output (W).
    pub on_threshold_w: f64,
    /// Debounced relay turns off at or below this output (W).
    pub off_threshold_w: f64,
    /// Dwell above `on_threshold_w` before turning on (s).
    pub on_delay_s: f64,
    /// Dwell below `off_threshold_w` before turning off (s).
    pub off_delay_s: f64,
    /// Simple relay is on strictly above this output (W).
    pub simple_threshold_w: f64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            on_threshold_w: 45.0,
            off_threshold_w: 35.0,
            on_delay_s: 0.5,
            off_delay_s: 1.0,
            simple_threshold_w: 40.0,
        }
    }
}

/// SOC thresholds of the source switch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerSwitchConfig {
    pub low_threshold_pct: f64,
    pub high_threshold_pct: f64,
    /// Minimum time between a switch and a return to the inverter (s).
    pub pwm_timer_s: f64,
}

impl Default for PowerSwitchConfig {
    fn default() -> Self {
        Self {
            low_threshold_pct: 30.0,
            high_threshold_pct: 40.0,
            pwm_timer_s: 10.0,
        }
    }
}

/// Battery bank parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Capacity (Ah, must be > 0).
    pub capacity_ah: f64,
    /// Nominal voltage (V, must be > 0).
    pub nominal_voltage: f64,
    /// Initial state of charge in percent.
    pub initial_soc_pct: f64,
    pub inverter_efficiency: f64,
    pub charge_efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_ah: 100.0,
            nominal_voltage: 12.0,
            initial_soc_pct: 70.0,
            inverter_efficiency: 0.90,
            charge_efficiency: 0.95,
        }
    }
}

/// Live run inputs and pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveConfig {
    /// AC load on the inverter (W).
    pub ac_load_w: f64,
    pub sunlight_intensity_pct: f64,
    pub sunlight_variability_pct: f64,
    /// Panel output at full sun (W).
    pub max_solar_w: f64,
    /// Simulated seconds per real second.
    pub speed: f64,
    /// Real time between two samples (ms).
    pub sample_interval_ms: u64,
    /// Samples kept for display.
    pub history_len: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ac_load_w: 500.0,
            sunlight_intensity_pct: 70.0,
            sunlight_variability_pct: 20.0,
            max_solar_w: 1000.0,
            speed: 1.0,
            sample_interval_ms: 50,
            history_len: 600,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.steps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the cloudy preset: heavier noise around a lower mean.
    pub fn cloudy() -> Self {
        Self {
            solar: SolarConfig {
                base_w: 45.0,
                noise_std_w: 35.0,
                ..SolarConfig::default()
            },
            live: LiveConfig {
                sunlight_intensity_pct: 40.0,
                sunlight_variability_pct: 50.0,
                ..LiveConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the wide-band preset: wider hysteresis and longer dwell times.
    pub fn wide_band() -> Self {
        Self {
            relay: RelayConfig {
                on_threshold_w: 55.0,
                off_threshold_w: 25.0,
                on_delay_s: 1.0,
                off_delay_s: 2.0,
                ..RelayConfig::default()
            },
            power_switch: PowerSwitchConfig {
                low_threshold_pct: 25.0,
                high_threshold_pct: 50.0,
                pwm_timer_s: 30.0,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cloudy", "wide_band"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cloudy" => Ok(Self::cloudy()),
            "wide_band" => Ok(Self::wide_band()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Crossed relay
    /// thresholds are accepted.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.steps < 2 {
            errors.push(ConfigError::new("simulation.steps", "must be >= 2"));
        }
        if !(s.duration_s > 0.0) {
            errors.push(ConfigError::new("simulation.duration_s", "must be > 0"));
        }

        let cc = &self.charge_controller;
        check_efficiency(&mut errors, "charge_controller.mppt_efficiency", cc.mppt_efficiency);
        check_efficiency(
            &mut errors,
            "charge_controller.pwm_base_efficiency",
            cc.pwm_base_efficiency,
        );

        let r = &self.relay;
        if !(r.on_delay_s >= 0.0) {
            errors.push(ConfigError::new("relay.on_delay_s", "must be >= 0"));
        }
        if !(r.off_delay_s >= 0.0) {
            errors.push(ConfigError::new("relay.off_delay_s", "must be >= 0"));
        }

        if !(self.power_switch.pwm_timer_s >= 0.0) {
            errors.push(ConfigError::new("power_switch.pwm_timer_s", "must be >= 0"));
        }

        let bat = &self.battery;
        if !(bat.capacity_ah > 0.0) {
            errors.push(ConfigError::new("battery.capacity_ah", "must be > 0"));
        }
        if !(bat.nominal_voltage > 0.0) {
            errors.push(ConfigError::new("battery.nominal_voltage", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&bat.initial_soc_pct) {
            errors.push(ConfigError::new(
                "battery.initial_soc_pct",
                "must be in [0.0, 100.0]",
            ));
        }
        check_efficiency(&mut errors, "battery.inverter_efficiency", bat.inverter_efficiency);
        check_efficiency(&mut errors, "battery.charge_efficiency", bat.charge_efficiency);

        let live = &self.live;
        if !(live.speed > 0.0) {
            errors.push(ConfigError::new("live.speed", "must be > 0"));
        }
        if live.history_len == 0 {
            errors.push(ConfigError::new("live.history_len", "must be > 0"));
        }
        if live.sample_interval_ms == 0 {
            errors.push(ConfigError::new("live.sample_interval_ms", "must be > 0"));
        }
        if live.sunlight_variability_pct < 0.0 {
            errors.push(ConfigError::new(
                "live.sunlight_variability_pct",
                "must be >= 0",
            ));
        }

        errors
    }

    /// Builds the batch relay comparison engine.
    ///
    /// # Panics
    ///
    /// Panics on a configuration that fails [`ScenarioConfig::validate`].
    pub fn build_engine(&self) -> RelayEngine {
        let sim = &self.simulation;
        let cc = &self.charge_controller;
        let r = &self.relay;

        let debounce = DebounceConfig::new(
            r.on_threshold_w,
            r.off_threshold_w,
            r.on_delay_s,
            r.off_delay_s,
        );
        let simple = SimpleRelay::new(r.simple_threshold_w);
        let mppt = ChargeController::Mppt {
            efficiency: cc.mppt_efficiency,
            max_output_w: cc.max_output_w,
        };
        let pwm = ChargeController::Pwm {
            base_efficiency: cc.pwm_base_efficiency,
            max_output_w: cc.max_output_w,
        };

        RelayEngine::new(
            SimConfig::new(sim.duration_s, sim.steps, sim.seed),
            NoisySolar::new(
                self.solar.base_w,
                self.solar.amplitude_w,
                self.solar.noise_std_w,
                sim.seed,
            ),
            RelayChannel::new(mppt, simple, debounce),
            RelayChannel::new(pwm, simple, debounce),
        )
    }

    /// Builds the live battery/inverter model.
    ///
    /// # Panics
    ///
    /// Panics on a configuration that fails [`ScenarioConfig::validate`].
    pub fn build_live_model(&self) -> LiveModel {
        let ps = &self.power_switch;
        let bat = &self.battery;
        let live = &self.live;
        let seed = self.simulation.seed;

        LiveModel::new(
            PowerSourceSwitch::new(ps.low_threshold_pct, ps.high_threshold_pct, ps.pwm_timer_s),
            LeadAcidBattery::new(
                bat.capacity_ah,
                bat.nominal_voltage,
                bat.initial_soc_pct,
                bat.inverter_efficiency,
                bat.charge_efficiency,
            ),
            IrradianceSolar::new(
                live.sunlight_intensity_pct,
                live.sunlight_variability_pct,
                live.max_solar_w,
                self.charge_controller.mppt_efficiency,
                seed,
            ),
            seed,
            live.ac_load_w,
            live.speed,
            live.history_len,
        )
    }

    /// Builds a stopped live simulation handle.
    pub fn build_live(&self) -> LiveSimulation {
        LiveSimulation::new(
            self.build_live_model(),
            Duration::from_millis(self.live.sample_interval_ms),
        )
    }
}

fn check_efficiency(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
    }
}
