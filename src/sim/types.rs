//! Core simulation types: timing configuration and per-step records.

use std::fmt;

use super::controller::RelayState;

/// Timing configuration of a batch run.
///
/// The time grid is `linspace(0, duration_s, steps)`: both endpoints are
/// sampled, so the interval is `duration_s / (steps - 1)`.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(10.0, 100, 42);
/// assert!((cfg.dt_s - 10.0 / 99.0).abs() < 1e-12);
/// assert_eq!(cfg.time_at(99), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulated span in seconds.
    pub duration_s: f64,
    /// Number of samples on the grid (including both endpoints).
    pub steps: usize,
    /// Interval between consecutive samples, derived from the other two.
    pub dt_s: f64,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new timing configuration.
    ///
    /// # Panics
    ///
    /// Panics if `steps < 2` or `duration_s` is not positive.
    pub fn new(duration_s: f64, steps: usize, seed: u64) -> Self {
        assert!(steps >= 2, "steps must be >= 2");
        assert!(duration_s > 0.0, "duration_s must be > 0");
        Self {
            duration_s,
            steps,
            dt_s: duration_s / (steps - 1) as f64,
            seed,
        }
    }

    /// Time of grid point `step`; the last point is exactly `duration_s`.
    pub fn time_at(&self, step: usize) -> f64 {
        if step + 1 == self.steps {
            self.duration_s
        } else {
            step as f64 * self.dt_s
        }
    }
}

/// Complete record of one batch timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Grid index.
    pub step: usize,
    /// Simulation time in seconds.
    pub time_s: f64,
    /// Raw solar panel power (W).
    pub solar_w: f64,
    /// MPPT charge controller output (W).
    pub mppt_w: f64,
    /// PWM charge controller output (W).
    pub pwm_w: f64,
    /// Undebounced relay on the MPPT output.
    pub mppt_simple: RelayState,
    /// Debounced hysteresis relay on the MPPT output.
    pub mppt_relay: RelayState,
    /// Undebounced relay on the PWM output.
    pub pwm_simple: RelayState,
    /// Debounced hysteresis relay on the PWM output.
    pub pwm_relay: RelayState,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({:>5.2}s) | solar={:>7.2} W  mppt={:>6.2} W  pwm={:>6.2} W | \
             MPPT simple={:<3} relay={:<3} | PWM simple={:<3} relay={:<3}",
            self.step,
            self.time_s,
            self.solar_w,
            self.mppt_w,
            self.pwm_w,
            self.mppt_simple,
            self.mppt_relay,
            self.pwm_simple,
            self.pwm_relay,
        )
    }
}
