//! Destinations for batches of data points
mod log_sink;
mod memory;

use async_trait::async_trait;

use crate::datum::Datum;
use crate::error::Result;

pub use log_sink::LogSink;
pub use memory::{MemorySink, SubmittedBatch};

/// Remote ingestion endpoint for data points
///
/// The publisher enforces the batch size limit; a sink only has to accept a
/// namespace and an ordered batch, and report success or failure. Sinks may
/// be called from several tasks at once.
#[async_trait]
pub trait MetricSink: Send + Sync + 'static {
    /// Submit one batch of data points under a namespace
    async fn put_metric_data(&self, namespace: &str, data: &[Datum]) -> Result<()>;

    /// Get a name for this sink
    fn name(&self) -> &str;
}
