use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::{Datum, Dimension, StandardUnit};
use crate::error::{MetricsError, Result};
use crate::metrics::{HistogramSnapshot, TimerSnapshot};

/// Percentiles reported for histograms and timers unless configured otherwise
pub const DEFAULT_PERCENTILES: [f64; 4] = [0.5, 0.75, 0.95, 0.99];

/// Storage resolution attached to every datum unless configured otherwise
pub const DEFAULT_STORAGE_RESOLUTION: i64 = 60;

/// Name suffix for a percentile fraction, e.g. `0.5` -> `p50`
pub fn percentile_suffix(p: f64) -> String {
    format!("p{}", (p * 100.0).round() as i64)
}

/// Validated, immutable configuration for [`Builder`]
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    units: HashMap<String, StandardUnit>,
    dimensions: Vec<Dimension>,
    percentiles: Vec<f64>,
    storage_resolution: i64,
}

impl BuilderConfig {
    /// Create a configuration, rejecting percentiles that are out of range
    /// or that would produce the same metric name suffix
    pub fn new(
        units: HashMap<String, StandardUnit>,
        dimensions: BTreeMap<String, String>,
        percentiles: Vec<f64>,
        storage_resolution: i64,
    ) -> Result<Self> {
        let mut suffixes: HashMap<String, f64> = HashMap::new();
        for &p in &percentiles {
            if !(0.0..=1.0).contains(&p) {
                return Err(MetricsError::Config(format!(
                    "percentile {} is outside [0, 1]",
                    p
                )));
            }
            if let Some(previous) = suffixes.insert(percentile_suffix(p), p) {
                return Err(MetricsError::Config(format!(
                    "percentiles {} and {} both map to {}",
                    previous,
                    p,
                    percentile_suffix(p)
                )));
            }
        }

        Ok(Self {
            units,
            dimensions: dimensions
                .into_iter()
                .map(|(name, value)| Dimension { name, value })
                .collect(),
            percentiles,
            storage_resolution,
        })
    }

    pub fn units(&self) -> &HashMap<String, StandardUnit> {
        &self.units
    }

    /// Dimensions in key order
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn storage_resolution(&self) -> i64 {
        self.storage_resolution
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            units: HashMap::new(),
            dimensions: Vec::new(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            storage_resolution: DEFAULT_STORAGE_RESOLUTION,
        }
    }
}

/// Converts one metric sample into data points
///
/// There is one operation per metric kind. Every datum returned from a call
/// carries `timestamp`; the publisher passes the same instant to every call
/// of a sweep.
pub trait DatumBuilder: Send + Sync + 'static {
    fn build_counter_data(&self, name: &str, count: i64, timestamp: DateTime<Utc>) -> Vec<Datum>;

    fn build_gauge_data(&self, name: &str, value: i64, timestamp: DateTime<Utc>) -> Vec<Datum>;

    fn build_gauge_float64_data(&self, name: &str, value: f64, timestamp: DateTime<Utc>) -> Vec<Datum>;

    fn build_meter_data(&self, name: &str, rate1: f64, timestamp: DateTime<Utc>) -> Vec<Datum>;

    /// Empty when nothing was recorded
    fn build_histogram_data(
        &self,
        name: &str,
        snapshot: &HistogramSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Vec<Datum>;

    /// Empty when nothing was recorded
    fn build_timer_data(
        &self,
        name: &str,
        snapshot: &TimerSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Vec<Datum>;
}

/// Default [`DatumBuilder`]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: BuilderConfig,
}

impl Builder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    fn datum(&self, name: String, value: f64, unit: StandardUnit, timestamp: DateTime<Utc>) -> Datum {
        Datum {
            metric_name: name,
            value,
            unit,
            dimensions: self.config.dimensions.clone(),
            timestamp,
            storage_resolution: self.config.storage_resolution,
        }
    }

    fn metric_unit(&self, name: &str, default: StandardUnit) -> StandardUnit {
        self.config.units.get(name).copied().unwrap_or(default)
    }

    fn single(&self, name: &str, value: f64, timestamp: DateTime<Utc>) -> Vec<Datum> {
        let unit = self.metric_unit(name, StandardUnit::Count);
        vec![self.datum(name.to_string(), value, unit, timestamp)]
    }

    /// `<name>.count` followed by one `<name>.pN` per configured percentile
    fn distribution(
        &self,
        name: &str,
        count: i64,
        values: Vec<f64>,
        unit: StandardUnit,
        timestamp: DateTime<Utc>,
    ) -> Vec<Datum> {
        let mut data = Vec::with_capacity(values.len() + 1);
        data.push(self.datum(
            format!("{}.count", name),
            count as f64,
            StandardUnit::Count,
            timestamp,
        ));

        for (p, value) in self.config.percentiles.iter().zip(values) {
            data.push(self.datum(
                format!("{}.{}", name, percentile_suffix(*p)),
                value,
                unit,
                timestamp,
            ));
        }
        data
    }
}

impl DatumBuilder for Builder {
    fn build_counter_data(&self, name: &str, count: i64, timestamp: DateTime<Utc>) -> Vec<Datum> {
        self.single(name, count as f64, timestamp)
    }

    fn build_gauge_data(&self, name: &str, value: i64, timestamp: DateTime<Utc>) -> Vec<Datum> {
        self.single(name, value as f64, timestamp)
    }

    fn build_gauge_float64_data(&self, name: &str, value: f64, timestamp: DateTime<Utc>) -> Vec<Datum> {
        self.single(name, value, timestamp)
    }

    fn build_meter_data(&self, name: &str, rate1: f64, timestamp: DateTime<Utc>) -> Vec<Datum> {
        self.single(name, rate1, timestamp)
    }

    fn build_histogram_data(
        &self,
        name: &str,
        snapshot: &HistogramSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Vec<Datum> {
        if snapshot.count() == 0 {
            return Vec::new();
        }

        let unit = self.metric_unit(name, StandardUnit::Count);
        let values = snapshot.percentiles(&self.config.percentiles);
        self.distribution(name, snapshot.count(), values, unit, timestamp)
    }

    fn build_timer_data(
        &self,
        name: &str,
        snapshot: &TimerSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Vec<Datum> {
        if snapshot.count() == 0 {
            return Vec::new();
        }

        let unit = self.metric_unit(name, StandardUnit::Milliseconds);
        let values = snapshot
            .percentiles(&self.config.percentiles)
            .into_iter()
            .map(|nanos| unit.convert_nanos(nanos))
            .collect();
        self.distribution(name, snapshot.count(), values, unit, timestamp)
    }
}
