use std::time::{Duration, Instant};

use super::sample::duration_to_nanos;
use super::{Histogram, Meter, Metric, MetricSample, TimerSnapshot};

/// Records durations and the rate at which they occur
///
/// Durations are kept in nanoseconds.
#[derive(Debug, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a duration
    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration_to_nanos(duration));
        self.meter.mark(1);
    }

    /// Record the time elapsed since `start`
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Run `f` and record how long it took
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.update_since(start);
        result
    }

    pub fn count(&self) -> i64 {
        self.histogram.count()
    }

    pub fn rate1(&self) -> f64 {
        self.meter.rate1()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let snapshot = self.histogram.snapshot();
        TimerSnapshot::new(snapshot.count(), snapshot.values().to_vec())
    }
}

impl Metric for Timer {
    fn kind(&self) -> &'static str {
        "timer"
    }

    fn sample(&self) -> Option<MetricSample> {
        Some(MetricSample::Timer(self.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_records_nanoseconds() {
        let timer = Timer::new();
        timer.update(Duration::from_millis(200));

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.percentiles(&[0.5]), vec![200_000_000.0]);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let timer = Timer::new();
        let value = timer.time(|| 41 + 1);
        assert_eq!(value, 42);
        assert_eq!(timer.count(), 1);
    }
}
