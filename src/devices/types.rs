//! Common types and traits for signal sources.

use rand::{Rng, rngs::StdRng};

/// Contextual information passed to signal sources at each sample.
/// # Fields
/// * `step` - Current sample index
/// * `time_s` - Current simulation time in seconds
pub struct DeviceContext {
    pub step: usize,
    pub time_s: f64,
}

impl DeviceContext {
    /// Creates a new DeviceContext for the given sample.
    pub fn new(step: usize, time_s: f64) -> Self {
        Self { step, time_s }
    }
}

/// Trait defining a device that produces a power signal.
///
/// This trait provides a common interface for the signal sources feeding the
/// relay controllers, allowing them to be used interchangeably by the engines.
pub trait Device {
    /// Returns the power produced at the given sample, in watts.
    ///
    /// # Arguments
    ///
    /// * `context` - Sample index and simulation time
    fn power_w(&mut self, context: &DeviceContext) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
