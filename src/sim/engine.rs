//! Batch engine comparing simple and debounced relays on MPPT and PWM outputs.

use tracing::{info, warn};

use crate::devices::{ChargeController, Device, DeviceContext, NoisySolar};

use super::clock::Clock;
use super::controller::{DebounceConfig, DebounceController, RelayState, SimpleRelay};
use super::stats::SimulationReport;
use super::types::{SimConfig, StepResult};

/// Simple and debounced relays attached to one charge controller.
#[derive(Debug, Clone)]
pub struct RelayChannel {
    converter: ChargeController,
    simple: SimpleRelay,
    relay: DebounceController,
}

impl RelayChannel {
    pub fn new(converter: ChargeController, simple: SimpleRelay, relay: DebounceConfig) -> Self {
        if !relay.has_hysteresis() {
            warn!(
                channel = converter.label(),
                on = relay.on_threshold,
                off = relay.off_threshold,
                "relay thresholds crossed, expect chatter"
            );
        }
        Self {
            converter,
            simple,
            relay: DebounceController::new(relay),
        }
    }

    /// Converts panel power and returns `(output_w, simple_state, debounced_state)`.
    ///
    /// Without a `dt` (first grid point) the debounced relay only reports its state.
    fn sample(&mut self, solar_w: f64, dt_s: Option<f64>) -> (f64, RelayState, RelayState) {
        let output_w = self.converter.output_w(solar_w);
        let simple = self.simple.evaluate(output_w);
        let relay = match dt_s {
            Some(dt) => self.relay.apply_sample(output_w, dt).unwrap_or_else(|e| {
                warn!(channel = self.converter.label(), error = %e, "sample rejected");
                self.relay.state()
            }),
            None => self.relay.state(),
        };
        (output_w, simple, relay)
    }

    pub fn relay(&self) -> &DebounceController {
        &self.relay
    }
}

/// Step records and the derived report of one batch run.
#[derive(Debug, Clone)]
pub struct RelayRun {
    pub results: Vec<StepResult>,
    pub report: SimulationReport,
}

/// Simulation engine owning the solar source and both relay channels.
///
/// Each channel's relays observe that channel's own converter output.
pub struct RelayEngine {
    config: SimConfig,
    solar: NoisySolar,
    mppt: RelayChannel,
    pwm: RelayChannel,
}

impl RelayEngine {
    /// Creates a new engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Time grid and seed
    /// * `solar` - Panel signal source
    /// * `mppt` - MPPT converter with its relays
    /// * `pwm` - PWM converter with its relays
    pub fn new(config: SimConfig, solar: NoisySolar, mppt: RelayChannel, pwm: RelayChannel) -> Self {
        Self {
            config,
            solar,
            mppt,
            pwm,
        }
    }

    /// Executes one grid point and returns its record.
    pub fn step(&mut self, step: usize, time_s: f64, dt_s: Option<f64>) -> StepResult {
        let context = DeviceContext::new(step, time_s);
        let solar_w = self.solar.power_w(&context);

        let (mppt_w, mppt_simple, mppt_relay) = self.mppt.sample(solar_w, dt_s);
        let (pwm_w, pwm_simple, pwm_relay) = self.pwm.sample(solar_w, dt_s);

        StepResult {
            step,
            time_s,
            solar_w,
            mppt_w,
            pwm_w,
            mppt_simple,
            mppt_relay,
            pwm_simple,
            pwm_relay,
        }
    }

    /// Walks the whole grid and returns every record with the run report.
    pub fn run(&mut self) -> RelayRun {
        info!(
            steps = self.config.steps,
            duration_s = self.config.duration_s,
            seed = self.config.seed,
            source = self.solar.device_type(),
            "starting relay comparison"
        );
        let mut clock = Clock::new(&self.config);
        let mut results = Vec::with_capacity(self.config.steps);
        clock.run(|tick| results.push(self.step(tick.step, tick.time_s, tick.dt_s)));

        let report = SimulationReport::from_results(&results);
        info!(
            mppt_switches = report.mppt.advanced_switches,
            pwm_switches = report.pwm.advanced_switches,
            "relay comparison finished"
        );
        RelayRun { results, report }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn mppt(&self) -> &RelayChannel {
        &self.mppt
    }

    pub fn pwm(&self) -> &RelayChannel {
        &self.pwm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(converter: ChargeController) -> RelayChannel {
        RelayChannel::new(
            converter,
            SimpleRelay::new(40.0),
            DebounceConfig::new(45.0, 35.0, 0.5, 1.0),
        )
    }

    fn engine(noise_std_w: f64, seed: u64) -> RelayEngine {
        RelayEngine::new(
            SimConfig::new(10.0, 100, seed),
            NoisySolar::new(50.0, 30.0, noise_std_w, seed),
            channel(ChargeController::Mppt {
                efficiency: 0.95,
                max_output_w: 100.0,
            }),
            channel(ChargeController::Pwm {
                base_efficiency: 0.75,
                max_output_w: 100.0,
            }),
        )
    }

    #[test]
    fn one_record_per_grid_point() {
        let run = engine(20.0, 42).run();
        assert_eq!(run.results.len(), 100);
        assert_eq!(run.results[0].step, 0);
        assert_eq!(run.results[99].time_s, 10.0);
    }

    #[test]
    fn debounced_relays_start_off() {
        let run = engine(20.0, 42).run();
        assert_eq!(run.results[0].mppt_relay, RelayState::Off);
        assert_eq!(run.results[0].pwm_relay, RelayState::Off);
    }

    #[test]
    fn debouncing_reduces_switching_on_noisy_input() {
        let run = engine(20.0, 42).run();
        let report = &run.report;
        assert!(report.mppt.advanced_switches <= report.mppt.simple_switches);
        assert!(report.pwm.advanced_switches <= report.pwm.simple_switches);
        assert!(report.mppt.simple_switches > 0);
    }

    #[test]
    fn mppt_outperforms_pwm() {
        let run = engine(20.0, 42).run();
        assert!(run.report.efficiency.mppt_advantage_pct > 0.0);
        for r in &run.results {
            assert!((0.0..=100.0).contains(&r.mppt_w));
            assert!((0.0..=100.0).contains(&r.pwm_w));
        }
    }

    #[test]
    fn channels_follow_their_own_output() {
        // Noise-free: the MPPT output is always above the PWM output, so at any
        // step the PWM simple relay can only be ON if the MPPT one is.
        let run = engine(0.0, 1).run();
        for r in &run.results {
            if r.pwm_simple.is_on() {
                assert!(r.mppt_simple.is_on(), "cross-wired at step {}", r.step);
            }
        }
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let a = engine(20.0, 7).run();
        let b = engine(20.0, 7).run();
        assert_eq!(a.results, b.results);
    }
}
