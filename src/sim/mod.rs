/// Simulation clock for the batch time grid.
pub mod clock;
pub mod controller;
pub mod engine;
/// Real-time battery/inverter loop.
pub mod live;
pub mod stats;
pub mod switch;
pub mod types;
