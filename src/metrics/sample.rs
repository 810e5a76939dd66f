use std::time::Duration;

/// A value read from the registry at poll time
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSample {
    Counter { count: i64 },
    Gauge { value: i64 },
    GaugeFloat64 { value: f64 },
    /// One-minute exponentially weighted rate, in events per second
    Meter { rate1: f64 },
    Histogram(HistogramSnapshot),
    Timer(TimerSnapshot),
}

/// Immutable copy of a histogram's recorded distribution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramSnapshot {
    count: i64,
    values: Vec<i64>,
}

impl HistogramSnapshot {
    /// Create a snapshot from the total event count and the sampled values
    pub fn new(count: i64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { count, values }
    }

    /// Number of events recorded, including those evicted from the sample
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Sampled values, sorted ascending
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Value at each of the given fractions of the sample
    ///
    /// Interpolates linearly between the two closest ranks at position
    /// `p * (n + 1)`, clamped to the smallest and largest sampled values.
    /// An empty sample yields zeros and a NaN fraction yields NaN.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let size = self.values.len();
        if size == 0 {
            return vec![0.0; ps.len()];
        }

        ps.iter()
            .map(|p| {
                let pos = p * (size + 1) as f64;
                if pos.is_nan() {
                    f64::NAN
                } else if pos < 1.0 {
                    self.values[0] as f64
                } else if pos >= size as f64 {
                    self.values[size - 1] as f64
                } else {
                    let lower = self.values[pos as usize - 1] as f64;
                    let upper = self.values[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }
}

/// Immutable copy of a timer's recorded durations, in nanoseconds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimerSnapshot {
    inner: HistogramSnapshot,
}

impl TimerSnapshot {
    /// Create a snapshot from raw nanosecond values
    pub fn new(count: i64, values_ns: Vec<i64>) -> Self {
        Self {
            inner: HistogramSnapshot::new(count, values_ns),
        }
    }

    /// Create a snapshot in which every duration was recorded exactly once
    pub fn from_durations(durations: &[Duration]) -> Self {
        let values = durations.iter().map(|d| duration_to_nanos(*d)).collect::<Vec<_>>();
        Self::new(values.len() as i64, values)
    }

    pub fn count(&self) -> i64 {
        self.inner.count()
    }

    /// Duration percentiles in nanoseconds
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        self.inner.percentiles(ps)
    }
}

/// Saturating conversion of a duration to signed nanoseconds
pub(crate) fn duration_to_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_single_value() {
        let snapshot = HistogramSnapshot::new(1, vec![2016]);
        assert_eq!(snapshot.percentiles(&[0.44, 0.5, 0.99]), vec![2016.0, 2016.0, 2016.0]);
    }

    #[test]
    fn test_percentiles_interpolate() {
        let snapshot = HistogramSnapshot::new(4, vec![40, 10, 30, 20]);
        assert_eq!(snapshot.values(), &[10, 20, 30, 40]);

        // pos = 0.5 * 5 = 2.5 -> halfway between 20 and 30
        assert_eq!(snapshot.percentiles(&[0.5]), vec![25.0]);
        // pos < 1 clamps to the minimum, pos >= n to the maximum
        assert_eq!(snapshot.percentiles(&[0.1, 0.9]), vec![10.0, 40.0]);
    }

    #[test]
    fn test_percentiles_out_of_range_fractions() {
        let snapshot = HistogramSnapshot::new(4, vec![10, 20, 30, 40]);
        let values = snapshot.percentiles(&[f64::NAN, -1.0, 2.0, f64::INFINITY, f64::NEG_INFINITY]);

        assert!(values[0].is_nan());
        assert_eq!(&values[1..], &[10.0, 40.0, 40.0, 10.0]);
    }

    #[test]
    fn test_percentiles_empty() {
        let snapshot = HistogramSnapshot::default();
        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.percentiles(&[0.5, 0.75]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_timer_snapshot_nanoseconds() {
        let snapshot = TimerSnapshot::from_durations(&[Duration::from_millis(200)]);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.percentiles(&[0.5]), vec![2e8]);
    }
}
