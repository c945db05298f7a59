//! Post-hoc switching and efficiency statistics.

use std::fmt;

use super::controller::RelayState;
use super::types::StepResult;

/// Number of OFF↔ON edges between consecutive states.
///
/// Equivalent to the sum of absolute differences of the 0/1 encoding.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::controller::RelayState::{Off, On};
/// use relay_sim::sim::stats::transition_count;
///
/// assert_eq!(transition_count(&[Off, On, On, Off, On]), 3);
/// assert_eq!(transition_count(&[]), 0);
/// ```
pub fn transition_count(states: &[RelayState]) -> usize {
    states.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Percentage of switching removed by the advanced controller.
///
/// Returns `0.0` when the simple controller never switched.
pub fn reduction_pct(simple: usize, advanced: usize) -> f64 {
    if simple == 0 {
        return 0.0;
    }
    (simple as f64 - advanced as f64) / simple as f64 * 100.0
}

/// Simple vs debounced switching for one relay channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingReport {
    /// Channel label (`"MPPT"`, `"PWM"`).
    pub label: &'static str,
    /// Transitions of the undebounced comparator.
    pub simple_switches: usize,
    /// Transitions of the debounced hysteresis controller.
    pub advanced_switches: usize,
    /// `(simple - advanced) / simple * 100`, or 0.
    pub reduction_pct: f64,
}

impl SwitchingReport {
    /// Builds a report from the two state sequences of a channel.
    pub fn from_states(label: &'static str, simple: &[RelayState], advanced: &[RelayState]) -> Self {
        let simple_switches = transition_count(simple);
        let advanced_switches = transition_count(advanced);
        Self {
            label,
            simple_switches,
            advanced_switches,
            reduction_pct: reduction_pct(simple_switches, advanced_switches),
        }
    }
}

impl fmt::Display for SwitchingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} Simple Control: {} switches (no delays)",
            self.label, self.simple_switches
        )?;
        write!(
            f,
            "{} Advanced Control: {} switches (with hysteresis & delays)",
            self.label, self.advanced_switches
        )
    }
}

/// Mean output of the two charge controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyReport {
    pub mppt_mean_w: f64,
    pub pwm_mean_w: f64,
    /// `mppt_mean_w - pwm_mean_w`.
    pub difference_w: f64,
    /// `(mppt / pwm - 1) * 100`, 0 when the PWM mean is 0.
    pub mppt_advantage_pct: f64,
}

impl EfficiencyReport {
    pub fn from_outputs(mppt_w: &[f64], pwm_w: &[f64]) -> Self {
        let mppt_mean_w = mean(mppt_w);
        let pwm_mean_w = mean(pwm_w);
        let mppt_advantage_pct = if pwm_mean_w != 0.0 {
            (mppt_mean_w / pwm_mean_w - 1.0) * 100.0
        } else {
            0.0
        };
        Self {
            mppt_mean_w,
            pwm_mean_w,
            difference_w: mppt_mean_w - pwm_mean_w,
            mppt_advantage_pct,
        }
    }
}

impl fmt::Display for EfficiencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MPPT average power output: {:.2}W", self.mppt_mean_w)?;
        writeln!(f, "PWM average power output: {:.2}W", self.pwm_mean_w)?;
        write!(
            f,
            "Efficiency difference: {:.2}W ({:.1}% MPPT advantage)",
            self.difference_w, self.mppt_advantage_pct
        )
    }
}

fn column(results: &[StepResult], f: impl Fn(&StepResult) -> RelayState) -> Vec<RelayState> {
    results.iter().map(f).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Full report of a batch relay run.
///
/// Computed post-hoc from the step records so the printed numbers always
/// agree with the exported telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub efficiency: EfficiencyReport,
    pub mppt: SwitchingReport,
    pub pwm: SwitchingReport,
}

impl SimulationReport {
    pub fn from_results(results: &[StepResult]) -> Self {
        let mppt_w: Vec<f64> = results.iter().map(|r| r.mppt_w).collect();
        let pwm_w: Vec<f64> = results.iter().map(|r| r.pwm_w).collect();

        Self {
            efficiency: EfficiencyReport::from_outputs(&mppt_w, &pwm_w),
            mppt: SwitchingReport::from_states(
                "MPPT",
                &column(results, |r| r.mppt_simple),
                &column(results, |r| r.mppt_relay),
            ),
            pwm: SwitchingReport::from_states(
                "PWM",
                &column(results, |r| r.pwm_simple),
                &column(results, |r| r.pwm_relay),
            ),
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== CONTROLLER EFFICIENCY COMPARISON ====")?;
        writeln!(f, "{}", self.efficiency)?;
        writeln!(f)?;
        writeln!(f, "==== RELAY SWITCHING STATISTICS ====")?;
        writeln!(f, "{}", self.mppt)?;
        writeln!(f, "{}", self.pwm)?;
        writeln!(f)?;
        write!(
            f,
            "Advanced control reduces relay switching by {:.1}% with MPPT and {:.1}% with PWM",
            self.mppt.reduction_pct, self.pwm.reduction_pct
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelayState::{Off, On};

    fn make_result(mppt_w: f64, pwm_w: f64, simple: RelayState, relay: RelayState) -> StepResult {
        StepResult {
            step: 0,
            time_s: 0.0,
            solar_w: mppt_w,
            mppt_w,
            pwm_w,
            mppt_simple: simple,
            mppt_relay: relay,
            pwm_simple: simple,
            pwm_relay: relay,
        }
    }

    #[test]
    fn counts_every_edge() {
        assert_eq!(transition_count(&[Off, On, Off, On, Off]), 4);
        assert_eq!(transition_count(&[On, On, On]), 0);
        assert_eq!(transition_count(&[On]), 0);
    }

    #[test]
    fn reduction_percentage() {
        assert!((reduction_pct(20, 5) - 75.0).abs() < 1e-12);
        assert_eq!(reduction_pct(4, 4), 0.0);
    }

    #[test]
    fn reduction_with_no_simple_switches_is_zero() {
        let pct = reduction_pct(0, 0);
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
        assert_eq!(reduction_pct(0, 3), 0.0);
    }

    #[test]
    fn efficiency_advantage() {
        let report = EfficiencyReport::from_outputs(&[95.0, 95.0], &[76.0, 76.0]);
        assert!((report.difference_w - 19.0).abs() < 1e-9);
        assert!((report.mppt_advantage_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn efficiency_with_zero_pwm_output() {
        let report = EfficiencyReport::from_outputs(&[10.0], &[0.0]);
        assert_eq!(report.mppt_advantage_pct, 0.0);
        let empty = EfficiencyReport::from_outputs(&[], &[]);
        assert_eq!(empty.mppt_mean_w, 0.0);
    }

    #[test]
    fn report_from_results() {
        let results = vec![
            make_result(50.0, 40.0, Off, Off),
            make_result(50.0, 40.0, On, Off),
            make_result(50.0, 40.0, Off, On),
            make_result(50.0, 40.0, On, On),
        ];
        let report = SimulationReport::from_results(&results);
        assert_eq!(report.mppt.simple_switches, 3);
        assert_eq!(report.mppt.advanced_switches, 1);
        assert!((report.pwm.reduction_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.efficiency.mppt_mean_w - 50.0).abs() < 1e-12);
    }

    #[test]
    fn display_contains_report_sections() {
        let report = SimulationReport::from_results(&[make_result(1.0, 1.0, Off, Off)]);
        let s = report.to_string();
        assert!(s.contains("==== RELAY SWITCHING STATISTICS ===="));
        assert!(s.contains("MPPT Simple Control: 0 switches"));
        assert!(s.contains("reduces relay switching by 0.0% with MPPT"));
    }
}
