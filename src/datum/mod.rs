//! Wire-level data points and the conversion from metric samples
mod builder;
mod unit;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use builder::{
    Builder, BuilderConfig, DEFAULT_PERCENTILES, DEFAULT_STORAGE_RESOLUTION, DatumBuilder,
    percentile_suffix,
};
pub use unit::StandardUnit;

/// A key/value tag attached to a datum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One named, timestamped, unit-tagged value ready for submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datum {
    pub metric_name: String,
    pub value: f64,
    pub unit: StandardUnit,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,
    pub timestamp: DateTime<Utc>,
    /// Retention granularity hint, in seconds
    pub storage_resolution: i64,
}
