//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use relay_sim::config::ScenarioConfig;
use relay_sim::devices::{ChargeController, NoisySolar};
use relay_sim::sim::controller::{DebounceConfig, SimpleRelay};
use relay_sim::sim::engine::{RelayChannel, RelayEngine};
use relay_sim::sim::live::LiveModel;
use relay_sim::sim::types::SimConfig;

/// Grid spacing of 100 points over 10 s.
pub const EXAMPLE_DT: f64 = 10.0 / 99.0;

/// 45/35 W band, 0.5 s on delay, 1.0 s off delay.
pub fn example_relay() -> DebounceConfig {
    DebounceConfig::new(45.0, 35.0, 0.5, 1.0)
}

/// 20 → 60 over the first second, back to 20 over the next 1.5 s, then flat.
pub fn ramp_value(t: f64) -> f64 {
    if t <= 1.0 {
        20.0 + 40.0 * t
    } else if t <= 2.5 {
        60.0 - 40.0 * (t - 1.0) / 1.5
    } else {
        20.0
    }
}

/// Default batch engine (10 s, 100 steps, seed 42).
pub fn default_engine() -> RelayEngine {
    default_engine_with_seed(42)
}

pub fn default_engine_with_seed(seed: u64) -> RelayEngine {
    let simple = SimpleRelay::new(40.0);
    RelayEngine::new(
        SimConfig::new(10.0, 100, seed),
        NoisySolar::new(50.0, 30.0, 20.0, seed),
        RelayChannel::new(
            ChargeController::Mppt {
                efficiency: 0.95,
                max_output_w: 100.0,
            },
            simple,
            example_relay(),
        ),
        RelayChannel::new(
            ChargeController::Pwm {
                base_efficiency: 0.75,
                max_output_w: 100.0,
            },
            simple,
            example_relay(),
        ),
    )
}

/// Small battery under a heavy load, so the switch cycles within minutes.
///
/// On the inverter the bank drains at roughly 1 kW; on mains it charges
/// at roughly 630 W.
pub fn cycling_live_model(pwm_timer_s: f64) -> LiveModel {
    let mut cfg = ScenarioConfig::baseline();
    cfg.battery.capacity_ah = 10.0;
    cfg.battery.initial_soc_pct = 50.0;
    cfg.live.ac_load_w = 1500.0;
    cfg.live.sunlight_variability_pct = 0.0;
    cfg.power_switch.pwm_timer_s = pwm_timer_s;
    cfg.build_live_model()
}
