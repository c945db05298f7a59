use crate::devices::types::{Device, DeviceContext, gaussian_noise};
use rand::{SeedableRng, rngs::StdRng};

/// A solar panel with a slow sinusoidal swing and heavy weather noise.
///
/// `NoisySolar` models a cloudy day as
/// `base_w + amplitude_w * sin(t) + N(0, noise_std_w)`,
/// where `t` is the simulation time in seconds. The raw signal is not
/// clipped; the charge controllers downstream clip their own outputs.
#[derive(Debug, Clone)]
pub struct NoisySolar {
    /// Mean panel output in watts.
    pub base_w: f64,

    /// Amplitude of the sinusoidal swing in watts.
    pub amplitude_w: f64,

    /// Standard deviation of the Gaussian weather noise in watts.
    pub noise_std_w: f64,

    /// Random number generator for noise generation.
    rng: StdRng,
}

impl NoisySolar {
    /// Creates a new noisy solar source.
    ///
    /// # Arguments
    ///
    /// * `base_w` - Mean output in watts
    /// * `amplitude_w` - Sinusoidal swing in watts
    /// * `noise_std_w` - Noise standard deviation in watts (negative clamps to 0)
    /// * `seed` - Random seed for reproducible noise generation
    pub fn new(base_w: f64, amplitude_w: f64, noise_std_w: f64, seed: u64) -> Self {
        Self {
            base_w,
            amplitude_w,
            noise_std_w: noise_std_w.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Device for NoisySolar {
    fn power_w(&mut self, context: &DeviceContext) -> f64 {
        let noise = gaussian_noise(&mut self.rng, self.noise_std_w);
        self.base_w + self.amplitude_w * context.time_s.sin() + noise
    }

    fn device_type(&self) -> &'static str {
        "SolarPanel"
    }
}
