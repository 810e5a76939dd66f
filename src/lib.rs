//! Periodically publish an in-process metrics registry to a cloud monitoring API
//!
//! A [`publisher::Publisher`] sweeps a [`registry::Registry`] once per
//! interval, turns every counter, gauge, meter, histogram and timer into
//! [`datum::Datum`] values and submits them to a [`sink::MetricSink`] in
//! bounded batches.

pub mod config;
pub mod datum;
pub mod error;
pub mod metrics;
pub mod publisher;
pub mod region;
pub mod registry;
pub mod sink;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Settings, SettingsOverride, load_settings};
    pub use crate::datum::{Builder, BuilderConfig, Datum, DatumBuilder, Dimension, StandardUnit};
    pub use crate::error::{MetricsError, Result};
    pub use crate::metrics::{Counter, Gauge, GaugeFloat64, Histogram, Meter, Metric, MetricSample, Timer};
    pub use crate::publisher::{Publisher, PublisherBuilder};
    pub use crate::registry::{MetricsRegistry, Registry};
    pub use crate::sink::{LogSink, MemorySink, MetricSink};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
