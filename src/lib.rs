//! Debounced relay and battery/inverter source switching simulator.

pub mod config;
pub mod devices;
/// CSV export of batch results.
pub mod io;
/// Relay controllers, source switch, engines and statistics.
pub mod sim;
#[cfg(feature = "tui")]
pub mod tui;
