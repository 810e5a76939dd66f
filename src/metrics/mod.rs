//! Live metric kinds and the snapshots read from them at poll time
mod counter;
mod gauge;
mod histogram;
mod meter;
mod sample;
mod timer;

// Re-export public items
pub use counter::Counter;
pub use gauge::{Gauge, GaugeFloat64};
pub use histogram::{Histogram, UniformSample, DEFAULT_RESERVOIR_SIZE};
pub use meter::Meter;
pub use sample::{HistogramSnapshot, MetricSample, TimerSnapshot};
pub use timer::Timer;

/// Anything that can live in a registry
///
/// `sample` returns `None` for kinds the publisher does not know how to
/// convert; those entries are logged and skipped on every sweep.
pub trait Metric: Send + Sync + 'static {
    /// Short name of the metric kind, used in log messages
    fn kind(&self) -> &'static str;

    /// Take a point-in-time sample of the metric
    fn sample(&self) -> Option<MetricSample>;
}
