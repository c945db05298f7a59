//! Signal sources feeding the relay controllers.

/// Lead-acid battery state-of-charge model.
pub mod battery;
/// MPPT and PWM solar charge controller models.
pub mod charge_controller;
/// Noisy sinusoidal solar input for batch runs.
pub mod solar;
/// Irradiance-driven solar input for live runs.
pub mod solar_irradiance;
pub mod types;

pub use battery::LeadAcidBattery;
pub use charge_controller::ChargeController;
pub use solar::NoisySolar;
pub use solar_irradiance::IrradianceSolar;
pub use types::Device;
pub use types::DeviceContext;
