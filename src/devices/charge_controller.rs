//! Solar charge controller models.

/// Solar charge controller between the panel and the battery bus.
///
/// Both variants clip their output to `[0, max_output_w]`.
///
/// # Examples
///
/// ```
/// use relay_sim::devices::ChargeController;
///
/// let mppt = ChargeController::Mppt { efficiency: 0.95, max_output_w: 100.0 };
/// assert!((mppt.output_w(50.0) - 47.5).abs() < 1e-9);
/// assert_eq!(mppt.output_w(-10.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeController {
    /// Maximum power point tracking: constant conversion efficiency.
    Mppt {
        /// Conversion efficiency (0..1.0).
        efficiency: f64,
        /// Output ceiling in watts.
        max_output_w: f64,
    },
    /// Pulse-width modulation: efficiency degrades in low light.
    ///
    /// `efficiency = base_efficiency * (0.9 + 0.1 * input_w / 100)`
    Pwm {
        /// Efficiency at 100 W input before the low-light penalty.
        base_efficiency: f64,
        /// Output ceiling in watts.
        max_output_w: f64,
    },
}

impl ChargeController {
    /// Converts panel power to controller output power (W).
    pub fn output_w(&self, input_w: f64) -> f64 {
        let (raw, max_output_w) = match *self {
            Self::Mppt {
                efficiency,
                max_output_w,
            } => (input_w * efficiency, max_output_w),
            Self::Pwm {
                base_efficiency,
                max_output_w,
            } => {
                let efficiency = base_efficiency * (0.9 + 0.1 * (input_w / 100.0));
                (input_w * efficiency, max_output_w)
            }
        };
        raw.clamp(0.0, max_output_w.max(0.0))
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mppt { .. } => "MPPT",
            Self::Pwm { .. } => "PWM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MPPT: ChargeController = ChargeController::Mppt {
        efficiency: 0.95,
        max_output_w: 100.0,
    };
    const PWM: ChargeController = ChargeController::Pwm {
        base_efficiency: 0.75,
        max_output_w: 100.0,
    };

    #[test]
    fn mppt_scales_and_clips() {
        assert!((MPPT.output_w(80.0) - 76.0).abs() < 1e-12);
        assert_eq!(MPPT.output_w(200.0), 100.0);
        assert_eq!(MPPT.output_w(-5.0), 0.0);
    }

    #[test]
    fn pwm_efficiency_depends_on_input() {
        // 100 W in: 0.75 * (0.9 + 0.1) = 0.75
        assert!((PWM.output_w(100.0) - 75.0).abs() < 1e-12);
        // 50 W in: 0.75 * 0.95 = 0.7125
        assert!((PWM.output_w(50.0) - 35.625).abs() < 1e-12);
    }

    #[test]
    fn mppt_beats_pwm_on_typical_input() {
        for p in [20.0, 50.0, 80.0] {
            assert!(MPPT.output_w(p) > PWM.output_w(p));
        }
    }

    #[test]
    fn labels() {
        assert_eq!(MPPT.label(), "MPPT");
        assert_eq!(PWM.label(), "PWM");
    }
}
