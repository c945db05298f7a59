//! Debounced dual-threshold (hysteresis) switching controller.
//!
//! A single [`DebounceController`] backs every binary decision in the crate:
//! the MPPT relay, the PWM relay and the battery/inverter power-source switch.

use std::fmt;

use thiserror::Error;
use tracing::debug;

/// Slack applied when comparing accumulated dwell time against a delay.
///
/// Summing a non-representable `dt` (e.g. `0.1`) drifts by a few ULPs.
const ACCUM_EPSILON_S: f64 = 1e-9;

/// Errors reported by [`DebounceController::apply_sample`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ControlError {
    /// The elapsed time since the previous sample was zero, negative or not finite.
    #[error("invalid timestep: dt must be > 0 and finite, got {dt}")]
    InvalidTimestep {
        /// Offending timestep (seconds).
        dt: f64,
    },
}

/// Binary output of a relay controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelayState {
    /// Relay open.
    #[default]
    Off,
    /// Relay closed.
    On,
}

impl RelayState {
    /// Returns `true` when the relay is closed.
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Numeric encoding used by statistics and telemetry (`Off = 0`, `On = 1`).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

impl From<bool> for RelayState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Off => "OFF",
            Self::On => "ON",
        })
    }
}

/// Static configuration of a [`DebounceController`].
///
/// `on_threshold > off_threshold` forms the hysteresis band. A crossed band
/// is accepted and behaves like a chatter-prone simple comparator.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::controller::DebounceConfig;
///
/// let cfg = DebounceConfig::new(45.0, 35.0, 0.5, 1.0);
/// assert!(cfg.has_hysteresis());
/// assert_eq!(cfg.reengage_guard_s, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceConfig {
    /// Value at or above which the OFF→ON dwell timer runs.
    pub on_threshold: f64,
    /// Value at or below which the ON→OFF dwell timer runs.
    pub off_threshold: f64,
    /// Seconds the signal must stay at/above `on_threshold` before switching ON.
    pub on_delay_s: f64,
    /// Seconds the signal must stay at/below `off_threshold` before switching OFF.
    pub off_delay_s: f64,
    /// Minimum seconds since the previous flip before an OFF→ON flip is accepted.
    pub reengage_guard_s: Option<f64>,
}

impl DebounceConfig {
    /// Creates a configuration without a re-engage guard.
    ///
    /// Negative delays are clamped to zero.
    pub fn new(on_threshold: f64, off_threshold: f64, on_delay_s: f64, off_delay_s: f64) -> Self {
        Self {
            on_threshold,
            off_threshold,
            on_delay_s: on_delay_s.max(0.0),
            off_delay_s: off_delay_s.max(0.0),
            reengage_guard_s: None,
        }
    }

    /// Adds a minimum dwell since the last flip that gates every OFF→ON flip.
    pub fn with_reengage_guard(mut self, guard_s: f64) -> Self {
        self.reengage_guard_s = Some(guard_s.max(0.0));
        self
    }

    /// Returns `true` when the band is well formed (`on_threshold > off_threshold`).
    pub fn has_hysteresis(&self) -> bool {
        self.on_threshold > self.off_threshold
    }
}

/// Debounced hysteresis controller.
///
/// Converts a noisy scalar stream into a binary decision. A flip only happens
/// once the signal has continuously satisfied the opposite threshold for the
/// configured delay; any interruption resets the dwell accumulator to zero.
///
/// Time is the controller's own: the sum of every accepted `dt`. Two
/// controllers fed the same `(value, dt)` sequence always agree.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::controller::{DebounceConfig, DebounceController, RelayState};
///
/// let mut relay = DebounceController::new(DebounceConfig::new(45.0, 35.0, 0.2, 0.2));
/// assert_eq!(relay.apply_sample(50.0, 0.1), Ok(RelayState::Off));
/// assert_eq!(relay.apply_sample(50.0, 0.1), Ok(RelayState::On));
/// assert!(relay.apply_sample(50.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceController {
    config: DebounceConfig,
    state: RelayState,
    on_accum_s: f64,
    off_accum_s: f64,
    elapsed_s: f64,
    last_transition_s: Option<f64>,
}

impl DebounceController {
    /// Creates a controller in the OFF state with zeroed accumulators.
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: RelayState::Off,
            on_accum_s: 0.0,
            off_accum_s: 0.0,
            elapsed_s: 0.0,
            last_transition_s: None,
        }
    }

    /// Applies one sample and returns the (possibly updated) state.
    ///
    /// # Arguments
    ///
    /// * `value` - Current reading (watts, SOC percent, ...)
    /// * `dt` - Seconds since the previous sample
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidTimestep`] when `dt` is not a positive
    /// finite number. The controller is left untouched in that case.
    pub fn apply_sample(&mut self, value: f64, dt: f64) -> Result<RelayState, ControlError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::InvalidTimestep { dt });
        }

        self.elapsed_s += dt;

        match self.state {
            RelayState::Off => {
                if value >= self.config.on_threshold {
                    self.on_accum_s += dt;
                    if self.dwell_reached(self.on_accum_s, self.config.on_delay_s)
                        && self.reengage_allowed()
                    {
                        self.transition(RelayState::On, value);
                    }
                } else {
                    self.on_accum_s = 0.0;
                }
            }
            RelayState::On => {
                if value <= self.config.off_threshold {
                    self.off_accum_s += dt;
                    if self.dwell_reached(self.off_accum_s, self.config.off_delay_s) {
                        self.transition(RelayState::Off, value);
                    }
                } else {
                    self.off_accum_s = 0.0;
                }
            }
        }

        Ok(self.state)
    }

    fn dwell_reached(&self, accum_s: f64, delay_s: f64) -> bool {
        accum_s + ACCUM_EPSILON_S >= delay_s
    }

    fn reengage_allowed(&self) -> bool {
        match (self.config.reengage_guard_s, self.last_transition_s) {
            (Some(guard_s), Some(last_s)) => self.elapsed_s - last_s + ACCUM_EPSILON_S >= guard_s,
            _ => true,
        }
    }

    fn transition(&mut self, next: RelayState, value: f64) {
        self.state = next;
        self.on_accum_s = 0.0;
        self.off_accum_s = 0.0;
        self.last_transition_s = Some(self.elapsed_s);
        debug!(t = self.elapsed_s, value, state = %next, "relay transition");
    }

    /// Re-zeroes all mutable state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Current output state.
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Current configuration.
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Seconds the ON condition has held continuously.
    pub fn on_accum_s(&self) -> f64 {
        self.on_accum_s
    }

    /// Seconds the OFF condition has held continuously.
    pub fn off_accum_s(&self) -> f64 {
        self.off_accum_s
    }

    /// Controller time (sum of accepted timesteps).
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Controller time of the most recent flip, if any.
    pub fn last_transition_s(&self) -> Option<f64> {
        self.last_transition_s
    }

    pub fn set_on_threshold(&mut self, value: f64) {
        self.config.on_threshold = value;
    }

    pub fn set_off_threshold(&mut self, value: f64) {
        self.config.off_threshold = value;
    }

    pub fn set_on_delay_s(&mut self, value: f64) {
        self.config.on_delay_s = value.max(0.0);
    }

    pub fn set_off_delay_s(&mut self, value: f64) {
        self.config.off_delay_s = value.max(0.0);
    }

    pub fn set_reengage_guard_s(&mut self, value: Option<f64>) {
        self.config.reengage_guard_s = value.map(|g| g.max(0.0));
    }
}

/// Undebounced single-threshold comparator: ON iff `value > threshold`.
///
/// This is the "simple control" baseline that debouncing is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleRelay {
    pub threshold: f64,
}

impl SimpleRelay {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn evaluate(&self, value: f64) -> RelayState {
        RelayState::from(value > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 10.0 / 99.0;

    fn example_relay() -> DebounceController {
        DebounceController::new(DebounceConfig::new(45.0, 35.0, 0.5, 1.0))
    }

    #[test]
    fn starts_off_with_zeroed_accumulators() {
        let relay = example_relay();
        assert_eq!(relay.state(), RelayState::Off);
        assert_eq!(relay.on_accum_s(), 0.0);
        assert_eq!(relay.off_accum_s(), 0.0);
        assert_eq!(relay.last_transition_s(), None);
    }

    #[test]
    fn turns_on_after_five_qualifying_steps() {
        let mut relay = example_relay();
        for step in 1..=4 {
            let state = relay.apply_sample(50.0, DT).expect("dt is valid");
            assert_eq!(state, RelayState::Off, "flipped early at step {step}");
        }
        assert_eq!(relay.apply_sample(50.0, DT), Ok(RelayState::On));
        assert_eq!(relay.on_accum_s(), 0.0);
        assert!((relay.last_transition_s().unwrap_or_default() - 5.0 * DT).abs() < 1e-12);
    }

    #[test]
    fn turns_off_after_ten_qualifying_steps() {
        let mut relay = example_relay();
        for _ in 0..5 {
            relay.apply_sample(60.0, DT).expect("dt is valid");
        }
        assert!(relay.state().is_on());

        for step in 1..=9 {
            let state = relay.apply_sample(20.0, DT).expect("dt is valid");
            assert_eq!(state, RelayState::On, "flipped early at step {step}");
        }
        assert_eq!(relay.apply_sample(20.0, DT), Ok(RelayState::Off));
    }

    #[test]
    fn interruption_resets_instead_of_pausing() {
        let mut relay = example_relay();
        for _ in 0..4 {
            relay.apply_sample(50.0, DT).expect("dt is valid");
        }
        relay.apply_sample(44.9, DT).expect("dt is valid");
        assert_eq!(relay.on_accum_s(), 0.0);

        // A paused accumulator would flip on the very next sample.
        for _ in 0..4 {
            assert_eq!(relay.apply_sample(50.0, DT), Ok(RelayState::Off));
        }
        assert_eq!(relay.apply_sample(50.0, DT), Ok(RelayState::On));
    }

    #[test]
    fn values_inside_band_hold_state() {
        let mut relay = DebounceController::new(DebounceConfig::new(45.0, 35.0, 0.0, 0.0));
        assert_eq!(relay.apply_sample(40.0, 0.1), Ok(RelayState::Off));
        assert_eq!(relay.apply_sample(45.0, 0.1), Ok(RelayState::On));
        assert_eq!(relay.apply_sample(40.0, 0.1), Ok(RelayState::On));
        assert_eq!(relay.apply_sample(35.0, 0.1), Ok(RelayState::Off));
        assert_eq!(relay.apply_sample(40.0, 0.1), Ok(RelayState::Off));
    }

    #[test]
    fn zero_delay_with_value_below_threshold_does_not_flip() {
        let mut relay = DebounceController::new(DebounceConfig::new(45.0, 35.0, 0.0, 0.0));
        assert_eq!(relay.apply_sample(10.0, 0.1), Ok(RelayState::Off));
    }

    #[test]
    fn rejects_non_positive_dt_without_mutation() {
        let mut relay = example_relay();
        relay.apply_sample(50.0, DT).expect("dt is valid");
        let before = relay.clone();

        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = relay.apply_sample(50.0, dt);
            assert!(matches!(err, Err(ControlError::InvalidTimestep { .. })));
            assert_eq!(relay.on_accum_s(), before.on_accum_s());
            assert_eq!(relay.elapsed_s(), before.elapsed_s());
            assert_eq!(relay.state(), before.state());
        }
    }

    #[test]
    fn crossed_thresholds_chatter_but_do_not_fail() {
        let cfg = DebounceConfig::new(30.0, 40.0, 0.0, 0.0);
        assert!(!cfg.has_hysteresis());
        let mut relay = DebounceController::new(cfg);
        assert_eq!(relay.apply_sample(35.0, 0.1), Ok(RelayState::On));
        assert_eq!(relay.apply_sample(35.0, 0.1), Ok(RelayState::Off));
        assert_eq!(relay.apply_sample(35.0, 0.1), Ok(RelayState::On));
    }

    #[test]
    fn reengage_guard_blocks_until_dwell_elapsed() {
        let cfg = DebounceConfig::new(40.0, 30.0, 0.0, 0.0).with_reengage_guard(1.0);
        let mut relay = DebounceController::new(cfg);

        // No previous flip: the guard is open.
        assert_eq!(relay.apply_sample(50.0, 0.25), Ok(RelayState::On));
        assert_eq!(relay.apply_sample(20.0, 0.25), Ok(RelayState::Off));

        for _ in 0..3 {
            assert_eq!(relay.apply_sample(50.0, 0.25), Ok(RelayState::Off));
        }
        assert_eq!(relay.apply_sample(50.0, 0.25), Ok(RelayState::On));
    }

    #[test]
    fn guard_does_not_affect_turning_off() {
        let cfg = DebounceConfig::new(40.0, 30.0, 0.0, 0.0).with_reengage_guard(100.0);
        let mut relay = DebounceController::new(cfg);
        relay.apply_sample(50.0, 0.1).expect("dt is valid");
        assert_eq!(relay.apply_sample(10.0, 0.1), Ok(RelayState::Off));
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut relay = example_relay();
        for _ in 0..6 {
            relay.apply_sample(60.0, DT).expect("dt is valid");
        }
        relay.set_on_threshold(50.0);
        relay.reset();
        assert_eq!(relay.state(), RelayState::Off);
        assert_eq!(relay.elapsed_s(), 0.0);
        assert_eq!(relay.last_transition_s(), None);
        assert_eq!(relay.config().on_threshold, 50.0);
    }

    #[test]
    fn simple_relay_is_strictly_greater() {
        let relay = SimpleRelay::new(40.0);
        assert_eq!(relay.evaluate(40.0), RelayState::Off);
        assert_eq!(relay.evaluate(40.01), RelayState::On);
    }
}
