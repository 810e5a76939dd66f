use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::MetricSink;
use crate::datum::Datum;
use crate::error::{MetricsError, Result};

/// One call made to a [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedBatch {
    pub namespace: String,
    pub data: Vec<Datum>,
}

#[derive(Debug, Default)]
struct MemoryState {
    calls: usize,
    batches: Vec<SubmittedBatch>,
}

/// A minimal in-memory sink for testing
///
/// Records every successful batch. Calls can be made to fail by index, and
/// each call can be made to take a fixed time before completing.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
    fail_on: HashSet<usize>,
    delay: Option<Duration>,
}

impl MemorySink {
    /// Create a new memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the calls with the given zero-based indices
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on = calls.into_iter().collect();
        self
    }

    /// Sleep for `delay` inside every call before recording it
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Batches recorded so far, in submission order
    pub fn batches(&self) -> Vec<SubmittedBatch> {
        self.state().batches.clone()
    }

    /// Number of calls made, including failed ones
    pub fn calls(&self) -> usize {
        self.state().calls
    }

    /// All recorded data points, flattened
    pub fn data(&self) -> Vec<Datum> {
        self.state()
            .batches
            .iter()
            .flat_map(|b| b.data.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl MetricSink for MemorySink {
    async fn put_metric_data(&self, namespace: &str, data: &[Datum]) -> Result<()> {
        let call = {
            let mut state = self.state();
            state.calls += 1;
            state.calls - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.contains(&call) {
            return Err(MetricsError::Sink(format!("injected failure on call {}", call)));
        }

        self.state().batches.push(SubmittedBatch {
            namespace: namespace.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
