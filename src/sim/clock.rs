use super::types::SimConfig;

/// One tick of the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Grid index, starting at 0.
    pub step: usize,
    /// Simulation time of this grid point (seconds).
    pub time_s: f64,
    /// Seconds since the previous tick; `None` on the first tick.
    pub dt_s: Option<f64>,
}

/// A simulation clock walking a fixed time grid.
///
/// The `Clock` provides methods to advance time tick-by-tick or run
/// a function at each tick until completion.
///
/// # Examples
///
/// ```
/// use relay_sim::sim::clock::Clock;
/// use relay_sim::sim::types::SimConfig;
///
/// let mut clock = Clock::new(&SimConfig::new(2.0, 3, 0));
/// let mut times = Vec::new();
///
/// clock.run(|tick| times.push(tick.time_s));
/// assert_eq!(times, vec![0.0, 1.0, 2.0]);
/// ```
pub struct Clock {
    /// Grid timing
    config: SimConfig,
    /// Next step to emit
    current: usize,
    /// Time of the previously emitted tick
    last_time_s: Option<f64>,
}

impl Clock {
    /// Creates a new clock positioned at the start of the grid.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            config: config.clone(),
            current: 0,
            last_time_s: None,
        }
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The tick for the current grid point
    /// * `None` - If the clock has walked the whole grid
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current >= self.config.steps {
            return None;
        }
        let step = self.current;
        let time_s = self.config.time_at(step);
        let dt_s = self.last_time_s.map(|prev| time_s - prev);
        self.current += 1;
        self.last_time_s = Some(time_s);
        Some(Tick { step, time_s, dt_s })
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_has_no_dt() {
        let mut clock = Clock::new(&SimConfig::new(1.0, 2, 0));
        let first = clock.tick();
        assert_eq!(first.map(|t| t.dt_s), Some(None));
        let second = clock.tick();
        assert_eq!(second.and_then(|t| t.dt_s), Some(1.0));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_run_visits_every_step() {
        let mut clock = Clock::new(&SimConfig::new(10.0, 100, 0));
        let mut steps = Vec::new();

        clock.run(|tick| steps.push(tick.step));

        assert_eq!(steps, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_dt_is_positive_on_every_tick() {
        let mut clock = Clock::new(&SimConfig::new(10.0, 100, 0));
        clock.run(|tick| {
            if let Some(dt) = tick.dt_s {
                assert!(dt > 0.0);
            }
        });
    }
}
