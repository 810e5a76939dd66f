use log::Log;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::Publisher;
use crate::config::{Settings, SettingsOverride};
use crate::datum::{Builder, DatumBuilder, StandardUnit};
use crate::error::Result;
use crate::registry::Registry;
use crate::sink::{LogSink, MetricSink};
use crate::util::logging::GlobalLogger;

/// Builder for a [`Publisher`]
///
/// Every setting has a default. Calls apply in order, later calls replacing
/// earlier ones, except unit overrides which are merged by metric name.
pub struct PublisherBuilder {
    registry: Arc<dyn Registry>,
    namespace: String,
    settings: Settings,
    sink: Option<Arc<dyn MetricSink>>,
    datum_builder: Option<Arc<dyn DatumBuilder>>,
    logger: Option<Arc<dyn Log>>,
    shutdown: Option<CancellationToken>,
}

impl PublisherBuilder {
    /// Create a new publisher builder
    pub fn new(registry: Arc<dyn Registry>, namespace: impl Into<String>) -> Self {
        Self {
            registry,
            namespace: namespace.into(),
            settings: Settings::default(),
            sink: None,
            datum_builder: None,
            logger: None,
            shutdown: None,
        }
    }

    /// Apply a partial set of settings, e.g. one loaded from a file
    pub fn settings(mut self, overrides: SettingsOverride) -> Self {
        self.settings.apply(overrides);
        self
    }

    /// Set the time between two publish cycles
    pub fn interval(mut self, interval: Duration) -> Self {
        self.settings.interval = interval;
        self
    }

    /// Set the units to report for the given metrics
    pub fn units(mut self, units: HashMap<String, StandardUnit>) -> Self {
        self.settings.units.extend(units);
        self
    }

    /// Set the unit to report for one metric
    pub fn unit(mut self, metric: impl Into<String>, unit: StandardUnit) -> Self {
        self.settings.units.insert(metric.into(), unit);
        self
    }

    /// Replace the dimensions attached to every data point
    pub fn dimensions(mut self, dimensions: BTreeMap<String, String>) -> Self {
        self.settings.dimensions = dimensions;
        self
    }

    /// Add or replace one dimension
    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.dimensions.insert(name.into(), value.into());
        self
    }

    /// Set the percentiles reported for histograms and timers
    pub fn percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.settings.percentiles = percentiles;
        self
    }

    /// Set the storage resolution, in seconds
    pub fn storage_resolution(mut self, seconds: i64) -> Self {
        self.settings.storage_resolution = seconds;
        self
    }

    /// Set the most data points sent in one submission
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.settings.max_batch_size = size;
        self
    }

    /// Abandon a submission that takes longer than `timeout`
    pub fn submit_timeout(mut self, timeout: Duration) -> Self {
        self.settings.submit_timeout = Some(timeout);
        self
    }

    /// Set the sink batches are submitted to
    pub fn sink(mut self, sink: Arc<dyn MetricSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the default datum builder
    pub fn datum_builder(mut self, builder: Arc<dyn DatumBuilder>) -> Self {
        self.datum_builder = Some(builder);
        self
    }

    /// Set the logger the publisher reports through
    pub fn logger(mut self, logger: Arc<dyn Log>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Stop the publisher when this token is cancelled
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Build the publisher
    ///
    /// Fails only on invalid settings: a zero interval or batch size, or
    /// percentiles that are out of range or share a name suffix.
    pub fn build(self) -> Result<Publisher> {
        self.settings.validate()?;
        let builder_config = self.settings.builder_config()?;

        let datum_builder = self
            .datum_builder
            .unwrap_or_else(|| Arc::new(Builder::new(builder_config)));

        Ok(Publisher {
            registry: self.registry,
            namespace: self.namespace,
            sink: self.sink.unwrap_or_else(|| Arc::new(LogSink::new())),
            datum_builder,
            logger: self.logger.unwrap_or_else(|| Arc::new(GlobalLogger)),
            interval: self.settings.interval,
            max_batch_size: self.settings.max_batch_size,
            submit_timeout: self.settings.submit_timeout,
            shutdown: self.shutdown.unwrap_or_else(CancellationToken::new),
        })
    }
}
