use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::{Metric, MetricSample};

/// An integer value that is set rather than accumulated
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Metric for Gauge {
    fn kind(&self) -> &'static str {
        "gauge"
    }

    fn sample(&self) -> Option<MetricSample> {
        Some(MetricSample::Gauge { value: self.value() })
    }
}

/// A floating point gauge, stored as the bit pattern of an `f64`
#[derive(Debug)]
pub struct GaugeFloat64 {
    bits: AtomicU64,
}

impl GaugeFloat64 {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for GaugeFloat64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for GaugeFloat64 {
    fn kind(&self) -> &'static str {
        "gauge_float64"
    }

    fn sample(&self) -> Option<MetricSample> {
        Some(MetricSample::GaugeFloat64 { value: self.value() })
    }
}
