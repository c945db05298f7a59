//! Live simulation handle and TUI application state.

use crate::config::ScenarioConfig;
use crate::sim::live::{LiveSimulation, LiveSnapshot};

/// Speed multipliers (slowest → fastest).
const SPEED_LEVELS: [f64; 8] = [0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0];

const THRESHOLD_STEP_PCT: f64 = 1.0;
const PWM_TIMER_STEP_S: f64 = 1.0;
const SUNLIGHT_STEP_PCT: f64 = 5.0;
const LOAD_STEP_W: f64 = 50.0;

/// TUI application state.
pub struct App {
    /// Live battery/inverter simulation driven by its own thread.
    live: LiveSimulation,
    /// Latest copy of the model, refreshed once per frame.
    pub snapshot: LiveSnapshot,
    /// Current index into `SPEED_LEVELS`.
    pub speed_idx: usize,
    /// Panel output at full sun, for the power chart bounds.
    pub max_solar_w: f64,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// Last error shown in the status panel.
    pub last_error: Option<String>,
}

impl App {
    /// Creates a stopped app from a validated scenario.
    pub fn new(scenario: &ScenarioConfig) -> Self {
        let live = scenario.build_live();
        let speed_idx = SPEED_LEVELS
            .iter()
            .position(|&s| s >= scenario.live.speed)
            .unwrap_or(SPEED_LEVELS.len() - 1);
        live.update(|m| m.set_speed(SPEED_LEVELS[speed_idx]));
        let snapshot = live.snapshot();
        Self {
            live,
            snapshot,
            speed_idx,
            max_solar_w: scenario.live.max_solar_w,
            quit: false,
            last_error: None,
        }
    }

    /// Pulls a fresh snapshot from the live model.
    pub fn refresh(&mut self) {
        self.snapshot = self.live.snapshot();
    }

    /// Starts or stops the live loop.
    pub fn toggle_running(&mut self) {
        if self.live.is_running() {
            self.live.stop();
        } else if let Err(e) = self.live.start() {
            self.last_error = Some(e.to_string());
        }
        self.refresh();
    }

    /// Stops the loop and rewinds to `t = 0`.
    pub fn reset(&mut self) {
        self.live.reset();
        self.refresh();
    }

    pub fn is_running(&self) -> bool {
        self.live.is_running()
    }

    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS.len() {
            self.speed_idx += 1;
            self.apply_speed();
        }
    }

    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
            self.apply_speed();
        }
    }

    fn apply_speed(&mut self) {
        let speed = SPEED_LEVELS[self.speed_idx];
        self.live.update(|m| m.set_speed(speed));
        self.refresh();
    }

    pub fn speed(&self) -> f64 {
        SPEED_LEVELS[self.speed_idx]
    }

    /// Moves the low SOC threshold by `steps` increments.
    pub fn nudge_low_threshold(&mut self, steps: f64) {
        let pct = (self.snapshot.low_threshold_pct + steps * THRESHOLD_STEP_PCT).clamp(0.0, 100.0);
        self.live.update(|m| m.set_low_threshold(pct));
        self.refresh();
    }

    /// Moves the high SOC threshold by `steps` increments.
    pub fn nudge_high_threshold(&mut self, steps: f64) {
        let pct = (self.snapshot.high_threshold_pct + steps * THRESHOLD_STEP_PCT).clamp(0.0, 100.0);
        self.live.update(|m| m.set_high_threshold(pct));
        self.refresh();
    }

    pub fn nudge_pwm_timer(&mut self, steps: f64) {
        let s = (self.snapshot.pwm_timer_s + steps * PWM_TIMER_STEP_S).max(0.0);
        self.live.update(|m| m.set_pwm_timer(s));
        self.refresh();
    }

    pub fn nudge_sunlight(&mut self, steps: f64) {
        let pct =
            (self.snapshot.sunlight_intensity_pct + steps * SUNLIGHT_STEP_PCT).clamp(0.0, 100.0);
        self.live.update(|m| m.set_sunlight_intensity(pct));
        self.refresh();
    }

    pub fn nudge_load(&mut self, steps: f64) {
        let w = (self.snapshot.load_w + steps * LOAD_STEP_W).max(0.0);
        self.live.update(|m| m.set_load(w));
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(&ScenarioConfig::baseline())
    }

    #[test]
    fn app_starts_stopped_at_zero() {
        let app = app();
        assert!(!app.is_running());
        assert_eq!(app.snapshot.time_s, 0.0);
        assert_eq!(app.speed(), 1.0);
    }

    #[test]
    fn toggle_runs_and_stops() {
        let mut app = app();
        app.toggle_running();
        assert!(app.is_running());
        app.toggle_running();
        assert!(!app.is_running());
        assert!(!app.snapshot.running);
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let mut app = app();
        for _ in 0..20 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);
        assert_eq!(app.snapshot.speed, SPEED_LEVELS[0]);

        for _ in 0..20 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS.len() - 1);
    }

    #[test]
    fn threshold_keys_keep_band_open() {
        let mut app = app();
        // 30/40: push low up past high.
        for _ in 0..10 {
            app.nudge_low_threshold(1.0);
        }
        assert_eq!(app.snapshot.low_threshold_pct, 40.0);
        assert_eq!(app.snapshot.high_threshold_pct, 45.0);

        for _ in 0..6 {
            app.nudge_high_threshold(-1.0);
        }
        assert_eq!(app.snapshot.high_threshold_pct, 39.0);
        assert_eq!(app.snapshot.low_threshold_pct, 35.0);
    }

    #[test]
    fn setting_keys_are_clamped() {
        let mut app = app();
        for _ in 0..20 {
            app.nudge_pwm_timer(-1.0);
            app.nudge_load(-1.0);
            app.nudge_sunlight(1.0);
        }
        assert_eq!(app.snapshot.pwm_timer_s, 0.0);
        assert_eq!(app.snapshot.load_w, 0.0);
        assert_eq!(app.snapshot.sunlight_intensity_pct, 100.0);
    }

    #[test]
    fn reset_rewinds() {
        let mut app = app();
        app.nudge_load(2.0);
        app.toggle_running();
        std::thread::sleep(std::time::Duration::from_millis(120));
        app.reset();
        assert!(!app.is_running());
        assert_eq!(app.snapshot.time_s, 0.0);
        assert!(app.snapshot.history.is_empty());
        assert_eq!(app.snapshot.load_w, 600.0);
    }
}
