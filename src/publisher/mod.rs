//! The poll/publish loop
//!
//! A [`Publisher`] waits for its interval to elapse, sweeps the registry,
//! converts every metric into data points and submits them to its sink in
//! batches. It runs until its cancellation token is cancelled; cancellation
//! is only observed between cycles, so a cycle in progress always finishes.
mod builder;

use chrono::Utc;
use log::{Level, Log};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::datum::{Datum, DatumBuilder};
use crate::error::{MetricsError, Result};
use crate::metrics::{Metric, MetricSample};
use crate::registry::Registry;
use crate::sink::MetricSink;
use crate::util::logging::log_to;

pub use builder::PublisherBuilder;

/// Periodically publishes a registry to a sink
pub struct Publisher {
    registry: Arc<dyn Registry>,
    namespace: String,
    sink: Arc<dyn MetricSink>,
    datum_builder: Arc<dyn DatumBuilder>,
    logger: Arc<dyn Log>,
    interval: Duration,
    max_batch_size: usize,
    submit_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl Publisher {
    /// Start building a publisher for `registry` under `namespace`
    pub fn builder(registry: Arc<dyn Registry>, namespace: impl Into<String>) -> PublisherBuilder {
        PublisherBuilder::new(registry, namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Token that stops the loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Publish once per interval until cancelled
    ///
    /// The first cycle starts one interval after the call. Ticks that fall
    /// due while a cycle is still submitting are delayed, never bunched.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            log_to!(self.logger.as_ref(), Level::Debug, "Waiting {:?}", self.interval);

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    log_to!(self.logger.as_ref(), Level::Debug, "Publisher for {} stopped", self.namespace);
                    return;
                }
                _ = ticker.tick() => {}
            }

            let data = self.poll_once();
            self.publish_metrics(&data).await;
        }
    }

    /// Sweep the registry and build the data points for every metric
    ///
    /// Every data point of a sweep carries the same timestamp. Metrics that
    /// cannot be sampled are logged and skipped.
    pub fn poll_once(&self) -> Vec<Datum> {
        log_to!(self.logger.as_ref(), Level::Debug, "Polling metrics");

        let now = Utc::now();
        let builder = self.datum_builder.as_ref();
        let logger = self.logger.as_ref();
        let mut data = Vec::new();

        let swept = self.registry.each(&mut |name: &str, metric: &dyn Metric| match metric.sample() {
            Some(MetricSample::Counter { count }) => {
                data.extend(builder.build_counter_data(name, count, now));
            }
            Some(MetricSample::Gauge { value }) => {
                data.extend(builder.build_gauge_data(name, value, now));
            }
            Some(MetricSample::GaugeFloat64 { value }) => {
                data.extend(builder.build_gauge_float64_data(name, value, now));
            }
            Some(MetricSample::Meter { rate1 }) => {
                data.extend(builder.build_meter_data(name, rate1, now));
            }
            Some(MetricSample::Histogram(snapshot)) => {
                data.extend(builder.build_histogram_data(name, &snapshot, now));
            }
            Some(MetricSample::Timer(snapshot)) => {
                data.extend(builder.build_timer_data(name, &snapshot, now));
            }
            None => {
                log_to!(
                    logger,
                    Level::Error,
                    "Received unexpected metric '{}' of kind {}",
                    name,
                    metric.kind()
                );
            }
        });

        if let Err(e) = swept {
            log_to!(logger, Level::Error, "Could not sweep registry: {}", e);
        }

        log_to!(logger, Level::Debug, "Received {} event(s)", data.len());
        data
    }

    /// Submit data points in order, at most `max_batch_size` per call
    ///
    /// A failed batch is logged and does not stop the ones after it.
    pub async fn publish_metrics(&self, data: &[Datum]) {
        let batches = data.len().div_ceil(self.max_batch_size);
        let mut failed = 0;

        for (index, batch) in data.chunks(self.max_batch_size).enumerate() {
            if let Err(e) = self.put_metrics(batch).await {
                failed += 1;
                log_to!(
                    self.logger.as_ref(),
                    Level::Error,
                    "Could not put chunk {}/{} of metrics to namespace {}: {}",
                    index + 1,
                    batches,
                    self.namespace,
                    e
                );
            }
        }

        log_to!(
            self.logger.as_ref(),
            Level::Debug,
            "Published {} of {} batch(es) to {}",
            batches - failed,
            batches,
            self.sink.name()
        );
    }

    async fn put_metrics(&self, batch: &[Datum]) -> Result<()> {
        let submit = self.sink.put_metric_data(&self.namespace, batch);
        match self.submit_timeout {
            Some(limit) => tokio::time::timeout(limit, submit).await.map_err(|_| {
                MetricsError::Timeout(format!("submission took longer than {:?}", limit))
            })?,
            None => submit.await,
        }
    }
}
