//! Battery/inverter power-source selector built on [`DebounceController`].

use std::fmt;

use tracing::warn;

use super::controller::{ControlError, DebounceConfig, DebounceController, RelayState};

/// Gap enforced between the low and high SOC thresholds when one is moved past the other.
pub const THRESHOLD_GAP_PCT: f64 = 5.0;

/// Which supply currently feeds the AC load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerSource {
    /// Utility mains; the battery only charges.
    #[default]
    Mains,
    /// Battery through the inverter.
    Inverter,
}

impl PowerSource {
    pub fn is_inverter(self) -> bool {
        self == Self::Inverter
    }
}

impl From<RelayState> for PowerSource {
    fn from(state: RelayState) -> Self {
        match state {
            RelayState::Off => Self::Mains,
            RelayState::On => Self::Inverter,
        }
    }
}

impl fmt::Display for PowerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Mains => "AC Mains",
            Self::Inverter => "Inverter",
        })
    }
}

/// SOC-driven source switch.
///
/// - Inverter → Mains as soon as `soc <= low_threshold_pct`.
/// - Mains → Inverter when `soc >= high_threshold_pct` and at least
///   `pwm_timer_s` has passed since the previous switch.
///
/// The thresholds always satisfy `high > low`; moving one past the other
/// pushes the other [`THRESHOLD_GAP_PCT`] away.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::switch::PowerSourceSwitch;
///
/// let mut switch = PowerSourceSwitch::new(30.0, 40.0, 10.0);
/// switch.set_high_threshold(35.0);
/// switch.set_low_threshold(40.0);
/// assert_eq!(switch.high_threshold_pct(), 45.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSourceSwitch {
    controller: DebounceController,
}

impl PowerSourceSwitch {
    /// Creates a switch on mains power.
    ///
    /// Crossed thresholds are corrected with `low` as the authoritative value.
    pub fn new(low_threshold_pct: f64, high_threshold_pct: f64, pwm_timer_s: f64) -> Self {
        let cfg = DebounceConfig::new(high_threshold_pct, low_threshold_pct, 0.0, 0.0)
            .with_reengage_guard(pwm_timer_s);
        let mut switch = Self {
            controller: DebounceController::new(cfg),
        };
        switch.set_low_threshold(low_threshold_pct);
        switch
    }

    /// Applies one SOC reading taken `dt` seconds after the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidTimestep`] for a non-positive `dt`.
    pub fn apply_soc(&mut self, soc_pct: f64, dt: f64) -> Result<PowerSource, ControlError> {
        self.controller.apply_sample(soc_pct, dt).map(PowerSource::from)
    }

    /// Sets the low threshold, pushing the high threshold up if needed.
    pub fn set_low_threshold(&mut self, low_pct: f64) {
        self.controller.set_off_threshold(low_pct);
        if low_pct >= self.high_threshold_pct() {
            let high = low_pct + THRESHOLD_GAP_PCT;
            warn!(low_pct, high_pct = high, "high threshold raised to keep the band open");
            self.controller.set_on_threshold(high);
        }
    }

    /// Sets the high threshold, pushing the low threshold down if needed.
    pub fn set_high_threshold(&mut self, high_pct: f64) {
        self.controller.set_on_threshold(high_pct);
        if high_pct <= self.low_threshold_pct() {
            let low = high_pct - THRESHOLD_GAP_PCT;
            warn!(high_pct, low_pct = low, "low threshold lowered to keep the band open");
            self.controller.set_off_threshold(low);
        }
    }

    pub fn set_pwm_timer(&mut self, pwm_timer_s: f64) {
        self.controller.set_reengage_guard_s(Some(pwm_timer_s));
    }

    pub fn source(&self) -> PowerSource {
        PowerSource::from(self.controller.state())
    }

    pub fn low_threshold_pct(&self) -> f64 {
        self.controller.config().off_threshold
    }

    pub fn high_threshold_pct(&self) -> f64 {
        self.controller.config().on_threshold
    }

    pub fn pwm_timer_s(&self) -> f64 {
        self.controller.config().reengage_guard_s.unwrap_or(0.0)
    }

    /// Switch time (sum of applied timesteps).
    pub fn sim_time_s(&self) -> f64 {
        self.controller.elapsed_s()
    }

    /// Time of the most recent source change, if any.
    pub fn last_switch_s(&self) -> Option<f64> {
        self.controller.last_transition_s()
    }

    /// Back to mains with a cleared history; thresholds and timer are kept.
    pub fn reset(&mut self) {
        self.controller.reset();
    }
}
