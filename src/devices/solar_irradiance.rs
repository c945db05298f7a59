//! Solar input driven by an adjustable sunlight intensity.

use crate::devices::types::{Device, DeviceContext};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Panel output as a fraction of full sun, with uniform cloud variability.
///
/// Output after the MPPT stage:
/// ```text
/// p = intensity/100 * max_w * (1 + U(-variability, variability)/100) * mppt_efficiency
/// ```
/// clipped at 0. Intensity and variability are percentages and may be
/// changed between samples.
#[derive(Debug, Clone)]
pub struct IrradianceSolar {
    /// Sunlight intensity in percent of full sun.
    pub intensity_pct: f64,

    /// Half-width of the uniform variability band in percent.
    pub variability_pct: f64,

    /// Panel output at 100 % intensity (W).
    pub max_w: f64,

    /// MPPT conversion efficiency (0..1.0).
    pub mppt_efficiency: f64,

    /// Random number generator for variability.
    rng: StdRng,
}

impl IrradianceSolar {
    /// Creates a new irradiance-driven source.
    ///
    /// # Arguments
    ///
    /// * `intensity_pct` - Sunlight intensity (percent)
    /// * `variability_pct` - Variability half-width (percent)
    /// * `max_w` - Output at full sun (W)
    /// * `mppt_efficiency` - MPPT efficiency (0..1.0)
    /// * `seed` - Random seed for reproducible variability
    pub fn new(
        intensity_pct: f64,
        variability_pct: f64,
        max_w: f64,
        mppt_efficiency: f64,
        seed: u64,
    ) -> Self {
        Self {
            intensity_pct,
            variability_pct,
            max_w,
            mppt_efficiency,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Device for IrradianceSolar {
    fn power_w(&mut self, _context: &DeviceContext) -> f64 {
        let base_w = self.intensity_pct / 100.0 * self.max_w;
        let factor = if self.variability_pct > 0.0 {
            1.0 + self
                .rng
                .random_range(-self.variability_pct..=self.variability_pct)
                / 100.0
        } else {
            1.0
        };
        (base_w * factor * self.mppt_efficiency).max(0.0)
    }

    fn device_type(&self) -> &'static str {
        "SolarMPPT"
    }
}
