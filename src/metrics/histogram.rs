use rand::Rng;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{HistogramSnapshot, Metric, MetricSample};

/// Default number of values kept by a uniform sample
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// A fixed-size reservoir holding a uniformly random subset of all values seen
#[derive(Debug)]
pub struct UniformSample {
    reservoir_size: usize,
    count: i64,
    values: Vec<i64>,
}

impl UniformSample {
    pub fn new(reservoir_size: usize) -> Self {
        Self {
            reservoir_size,
            count: 0,
            values: Vec::with_capacity(reservoir_size.min(DEFAULT_RESERVOIR_SIZE)),
        }
    }

    /// Record a value, replacing a random one once the reservoir is full
    pub fn update(&mut self, value: i64) {
        self.count += 1;
        if self.values.len() < self.reservoir_size {
            self.values.push(value);
            return;
        }

        let slot = rand::rng().random_range(0..self.count);
        if (slot as usize) < self.reservoir_size {
            self.values[slot as usize] = value;
        }
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.values.clear();
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot::new(self.count, self.values.clone())
    }
}

/// Tracks the distribution of a stream of integer values
#[derive(Debug)]
pub struct Histogram {
    sample: Mutex<UniformSample>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::with_reservoir_size(DEFAULT_RESERVOIR_SIZE)
    }

    pub fn with_reservoir_size(size: usize) -> Self {
        Self {
            sample: Mutex::new(UniformSample::new(size)),
        }
    }

    fn sample_mut(&self) -> MutexGuard<'_, UniformSample> {
        self.sample.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, value: i64) {
        self.sample_mut().update(value);
    }

    pub fn clear(&self) {
        self.sample_mut().clear();
    }

    pub fn count(&self) -> i64 {
        self.sample_mut().count
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.sample_mut().snapshot()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for Histogram {
    fn kind(&self) -> &'static str {
        "histogram"
    }

    fn sample(&self) -> Option<MetricSample> {
        Some(MetricSample::Histogram(self.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservoir_is_bounded() {
        let histogram = Histogram::with_reservoir_size(10);
        for v in 0..1000 {
            histogram.update(v);
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count(), 1000);
        assert_eq!(snapshot.values().len(), 10);
        assert!(snapshot.values().iter().all(|v| (0..1000).contains(v)));
    }

    #[test]
    fn test_clear() {
        let histogram = Histogram::new();
        histogram.update(1);
        histogram.clear();
        assert_eq!(histogram.count(), 0);
        assert!(histogram.snapshot().values().is_empty());
    }
}
