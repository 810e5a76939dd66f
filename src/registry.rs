use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::{MetricsError, Result};
use crate::metrics::Metric;

/// Read-only view of a set of named metrics
///
/// The publisher sweeps a registry once per cycle. Implementations own their
/// iteration order and must tolerate writers adding or removing entries
/// between sweeps.
pub trait Registry: Send + Sync + 'static {
    /// Visit every registered metric
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Metric)) -> Result<()>;
}

/// In-process registry keyed by metric name
///
/// Iteration is in name order. A sweep clones the entry list under the read
/// lock and visits it after releasing the lock, so registration never waits
/// on a publisher.
pub struct MetricsRegistry {
    metrics: RwLock<BTreeMap<String, Arc<dyn Metric>>>,
}

impl MetricsRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a metric under a name that is not already taken
    pub fn register(&self, name: impl Into<String>, metric: Arc<dyn Metric>) -> Result<()> {
        let name = name.into();
        let mut metrics = self
            .metrics
            .write()
            .map_err(|_| MetricsError::poisoned("registry"))?;

        if metrics.contains_key(&name) {
            return Err(MetricsError::Registry(format!(
                "duplicate metric: {}",
                name
            )));
        }

        debug!("Registering {} metric '{}'", metric.kind(), name);
        metrics.insert(name, metric);
        Ok(())
    }

    /// Get the metric registered under `name`, registering `make()` if absent
    pub fn get_or_register<M, F>(&self, name: &str, make: F) -> Result<Arc<dyn Metric>>
    where
        M: Metric,
        F: FnOnce() -> M,
    {
        let mut metrics = self
            .metrics
            .write()
            .map_err(|_| MetricsError::poisoned("registry"))?;

        let metric = metrics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(make()) as Arc<dyn Metric>);
        Ok(Arc::clone(metric))
    }

    /// Get a metric by name
    pub fn get(&self, name: &str) -> Result<Option<Arc<dyn Metric>>> {
        let metrics = self
            .metrics
            .read()
            .map_err(|_| MetricsError::poisoned("registry"))?;
        Ok(metrics.get(name).cloned())
    }

    /// Remove a metric by name
    pub fn unregister(&self, name: &str) -> Result<Option<Arc<dyn Metric>>> {
        let mut metrics = self
            .metrics
            .write()
            .map_err(|_| MetricsError::poisoned("registry"))?;
        Ok(metrics.remove(name))
    }

    /// Count the registered metrics
    pub fn len(&self) -> Result<usize> {
        let metrics = self
            .metrics
            .read()
            .map_err(|_| MetricsError::poisoned("registry"))?;
        Ok(metrics.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MetricsRegistry {
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Metric)) -> Result<()> {
        let entries: Vec<(String, Arc<dyn Metric>)> = {
            let metrics = self
                .metrics
                .read()
                .map_err(|_| MetricsError::poisoned("registry"))?;
            metrics
                .iter()
                .map(|(name, metric)| (name.clone(), Arc::clone(metric)))
                .collect()
        };

        for (name, metric) in &entries {
            visit(name, metric.as_ref());
        }
        Ok(())
    }
}
