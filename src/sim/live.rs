//! Real-time driving loop for the battery/inverter power-source switch.
//!
//! The model (switch, battery, solar source, history) sits behind a single
//! mutex and is advanced as one unit, so readers only ever see complete
//! states. Readers take [`LiveSnapshot`] copies; they never hold the lock
//! while rendering.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::devices::{Device, DeviceContext, IrradianceSolar, LeadAcidBattery};

use super::controller::ControlError;
use super::switch::{PowerSource, PowerSourceSwitch};

/// Errors raised while controlling the live loop.
#[derive(Debug, Error)]
pub enum LiveError {
    /// The driver thread could not be spawned.
    #[error("failed to spawn live driver thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// One recorded sample of the live model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSample {
    pub time_s: f64,
    pub soc_pct: f64,
    pub solar_w: f64,
    pub load_w: f64,
    pub source: PowerSource,
}

/// Immutable copy of the live model taken under the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    pub running: bool,
    pub time_s: f64,
    pub soc_pct: f64,
    pub voltage: f64,
    pub solar_w: f64,
    pub load_w: f64,
    pub source: PowerSource,
    pub low_threshold_pct: f64,
    pub high_threshold_pct: f64,
    pub pwm_timer_s: f64,
    pub sunlight_intensity_pct: f64,
    pub sunlight_variability_pct: f64,
    pub speed: f64,
    /// Oldest first.
    pub history: Vec<LiveSample>,
}

/// Battery, solar input and source switch advanced together.
#[derive(Debug, Clone)]
pub struct LiveModel {
    switch: PowerSourceSwitch,
    battery: LeadAcidBattery,
    solar: IrradianceSolar,
    solar_seed: u64,
    initial_soc_pct: f64,
    load_w: f64,
    speed: f64,
    time_s: f64,
    step: usize,
    last_solar_w: f64,
    history: VecDeque<LiveSample>,
    history_len: usize,
}

impl LiveModel {
    /// Creates a model at `t = 0` on mains power.
    ///
    /// # Arguments
    ///
    /// * `switch` - Source switch with its thresholds and pwm timer
    /// * `battery` - Battery bank; its current SOC is the reset point
    /// * `solar` - Solar input after the MPPT stage
    /// * `solar_seed` - Seed used to rebuild the solar source on reset
    /// * `load_w` - AC load (W)
    /// * `speed` - Simulated seconds per real second
    /// * `history_len` - Number of samples kept for readers (at least 1)
    pub fn new(
        switch: PowerSourceSwitch,
        battery: LeadAcidBattery,
        solar: IrradianceSolar,
        solar_seed: u64,
        load_w: f64,
        speed: f64,
        history_len: usize,
    ) -> Self {
        let history_len = history_len.max(1);
        Self {
            switch,
            initial_soc_pct: battery.soc_pct,
            battery,
            solar,
            solar_seed,
            load_w,
            speed,
            time_s: 0.0,
            step: 0,
            last_solar_w: 0.0,
            history: VecDeque::with_capacity(history_len),
            history_len,
        }
    }

    /// Advances the model by `dt_s` simulated seconds.
    ///
    /// Order per sample: solar input, battery integration, source switching.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidTimestep`] for a non-positive `dt_s`;
    /// nothing is mutated in that case.
    pub fn advance(&mut self, dt_s: f64) -> Result<LiveSample, ControlError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(ControlError::InvalidTimestep { dt: dt_s });
        }

        self.time_s += dt_s;
        let context = DeviceContext::new(self.step, self.time_s);
        self.step += 1;

        let solar_w = self.solar.power_w(&context);
        let on_inverter = self.switch.source() == PowerSource::Inverter;
        let soc_pct = self.battery.update(solar_w, self.load_w, on_inverter, dt_s);
        let source = self.switch.apply_soc(soc_pct, dt_s)?;
        if source.is_inverter() != on_inverter {
            info!(t = self.time_s, soc_pct, %source, "power source switched");
        }

        self.last_solar_w = solar_w;
        let sample = LiveSample {
            time_s: self.time_s,
            soc_pct,
            solar_w,
            load_w: self.load_w,
            source,
        };
        if self.history.len() >= self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(sample);
        Ok(sample)
    }

    /// Back to `t = 0`: empty history, initial SOC, mains, reseeded solar.
    ///
    /// Settings (thresholds, pwm timer, load, sunlight, speed) are kept.
    pub fn reset(&mut self) {
        self.switch.reset();
        self.battery.set_soc(self.initial_soc_pct);
        self.solar = IrradianceSolar::new(
            self.solar.intensity_pct,
            self.solar.variability_pct,
            self.solar.max_w,
            self.solar.mppt_efficiency,
            self.solar_seed,
        );
        self.time_s = 0.0;
        self.step = 0;
        self.last_solar_w = 0.0;
        self.history.clear();
    }

    /// Copies the current state out.
    pub fn snapshot(&self, running: bool) -> LiveSnapshot {
        LiveSnapshot {
            running,
            time_s: self.time_s,
            soc_pct: self.battery.soc_pct,
            voltage: self.battery.voltage(),
            solar_w: self.last_solar_w,
            load_w: self.load_w,
            source: self.switch.source(),
            low_threshold_pct: self.switch.low_threshold_pct(),
            high_threshold_pct: self.switch.high_threshold_pct(),
            pwm_timer_s: self.switch.pwm_timer_s(),
            sunlight_intensity_pct: self.solar.intensity_pct,
            sunlight_variability_pct: self.solar.variability_pct,
            speed: self.speed,
            history: self.history.iter().copied().collect(),
        }
    }

    pub fn set_low_threshold(&mut self, pct: f64) {
        self.switch.set_low_threshold(pct);
    }

    pub fn set_high_threshold(&mut self, pct: f64) {
        self.switch.set_high_threshold(pct);
    }

    pub fn set_pwm_timer(&mut self, seconds: f64) {
        self.switch.set_pwm_timer(seconds.max(0.0));
    }

    pub fn set_load(&mut self, watts: f64) {
        self.load_w = watts;
    }

    pub fn set_sunlight_intensity(&mut self, pct: f64) {
        self.solar.intensity_pct = pct;
    }

    pub fn set_sunlight_variability(&mut self, pct: f64) {
        self.solar.variability_pct = pct.max(0.0);
    }

    /// Overrides the battery state of charge (clamped to [0, 100]).
    pub fn set_soc(&mut self, pct: f64) {
        self.battery.set_soc(pct);
    }

    /// Non-positive speeds are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed > 0.0 && speed.is_finite() {
            self.speed = speed;
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn source(&self) -> PowerSource {
        self.switch.source()
    }

    pub fn switch(&self) -> &PowerSourceSwitch {
        &self.switch
    }
}

fn lock(model: &Mutex<LiveModel>) -> MutexGuard<'_, LiveModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle owning the live model and its optional driver thread.
///
/// The driver thread is the only writer of simulation state while running.
/// Setting changes go through [`LiveSimulation::update`], which applies them
/// under the same lock between two samples.
pub struct LiveSimulation {
    model: Arc<Mutex<LiveModel>>,
    stop: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
    sample_interval: Duration,
}

impl LiveSimulation {
    /// Wraps a model; the loop is not started.
    pub fn new(model: LiveModel, sample_interval: Duration) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            stop: Arc::new(AtomicBool::new(false)),
            driver: None,
            sample_interval,
        }
    }

    /// Starts (or resumes) the driver thread. No-op when already running.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Spawn`] if the OS refuses a new thread.
    pub fn start(&mut self) -> Result<(), LiveError> {
        if self.driver.is_some() {
            return Ok(());
        }
        self.stop.store(false, Ordering::Release);

        let model = Arc::clone(&self.model);
        let stop = Arc::clone(&self.stop);
        let interval = self.sample_interval;
        let handle = thread::Builder::new()
            .name("live-driver".to_string())
            .spawn(move || drive(&model, &stop, interval))?;

        info!(interval_ms = interval.as_millis() as u64, "live simulation started");
        self.driver = Some(handle);
        Ok(())
    }

    /// Stops the driver thread and waits for it. The model is left as-is.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.driver.take() {
            if handle.join().is_err() {
                warn!("live driver thread panicked");
            }
            info!(t = lock(&self.model).time_s(), "live simulation stopped");
        }
    }

    /// Stops the loop and resets the model to `t = 0`.
    pub fn reset(&mut self) {
        self.stop();
        lock(&self.model).reset();
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_some()
    }

    /// Atomic copy of the current model state.
    pub fn snapshot(&self) -> LiveSnapshot {
        let running = self.is_running();
        lock(&self.model).snapshot(running)
    }

    /// Applies a settings change under the model lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut LiveModel) -> R) -> R {
        f(&mut lock(&self.model))
    }
}

impl Drop for LiveSimulation {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drive(model: &Mutex<LiveModel>, stop: &AtomicBool, interval: Duration) {
    let mut last = Instant::now();
    while !stop.load(Ordering::Acquire) {
        thread::sleep(interval);
        let now = Instant::now();
        let real_dt_s = now.duration_since(last).as_secs_f64();
        last = now;

        let mut guard = lock(model);
        let dt_s = real_dt_s * guard.speed();
        if let Err(e) = guard.advance(dt_s) {
            warn!(error = %e, "live sample skipped");
        }
    }
}
