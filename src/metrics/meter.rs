use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{Metric, MetricSample};

/// Interval at which the moving averages decay
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average over a window of minutes
#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: i64,
    initialized: bool,
}

impl Ewma {
    fn new(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self {
            alpha,
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    fn update(&mut self, n: i64) {
        self.uncounted += n;
    }

    fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Apply `ticks` ticks at once
    ///
    /// Only the first tick sees the uncounted events; every later one decays
    /// the rate towards zero, which is `(1 - alpha)^(ticks - 1)` in total.
    fn tick_many(&mut self, ticks: u128) {
        if ticks == 0 {
            return;
        }
        self.tick();
        let idle = (ticks - 1).min(i32::MAX as u128) as i32;
        self.rate *= (1.0 - self.alpha).powi(idle);
    }
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    started: Instant,
    last_tick: Instant,
}

impl MeterState {
    fn tick_if_necessary(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = elapsed.as_nanos() / TICK_INTERVAL.as_nanos();
        if ticks == 0 {
            return;
        }

        self.last_tick += TICK_INTERVAL * ticks.min(u32::MAX as u128) as u32;
        self.m1.tick_many(ticks);
        self.m5.tick_many(ticks);
        self.m15.tick_many(ticks);
    }
}

/// Counts events and tracks their 1, 5 and 15 minute rates
///
/// The moving averages tick lazily: every read or write first applies the
/// ticks that elapsed since the previous one, so no background task is needed.
#[derive(Debug)]
pub struct Meter {
    state: Mutex<MeterState>,
}

impl Meter {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            state: Mutex::new(MeterState {
                count: 0,
                m1: Ewma::new(1.0),
                m5: Ewma::new(5.0),
                m15: Ewma::new(15.0),
                started: now,
                last_tick: now,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MeterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `n` events
    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now());
    }

    fn mark_at(&self, n: i64, now: Instant) {
        let mut state = self.state();
        state.tick_if_necessary(now);
        state.count += n;
        state.m1.update(n);
        state.m5.update(n);
        state.m15.update(n);
    }

    pub fn count(&self) -> i64 {
        self.state().count
    }

    /// One-minute moving average rate, in events per second
    pub fn rate1(&self) -> f64 {
        self.rate1_at(Instant::now())
    }

    fn rate1_at(&self, now: Instant) -> f64 {
        let mut state = self.state();
        state.tick_if_necessary(now);
        state.m1.rate
    }

    pub fn rate5(&self) -> f64 {
        let mut state = self.state();
        state.tick_if_necessary(Instant::now());
        state.m5.rate
    }

    pub fn rate15(&self) -> f64 {
        let mut state = self.state();
        state.tick_if_necessary(Instant::now());
        state.m15.rate
    }

    /// Mean rate since the meter was created
    pub fn rate_mean(&self) -> f64 {
        let state = self.state();
        let elapsed = state.started.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        state.count as f64 / elapsed
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for Meter {
    fn kind(&self) -> &'static str {
        "meter"
    }

    fn sample(&self) -> Option<MetricSample> {
        Some(MetricSample::Meter { rate1: self.rate1() })
    }
}
