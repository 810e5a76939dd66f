use async_trait::async_trait;
use log::{Level, info, log_enabled};

use super::MetricSink;
use crate::datum::Datum;
use crate::error::{MetricsError, Result};

/// Sink that writes each batch as a JSON request body to the log at info level
///
/// Used when no remote client is configured, and handy for checking what a
/// publisher would send.
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            name: "log".to_string(),
        }
    }

    /// Render the request body the monitoring API expects
    pub fn render(namespace: &str, data: &[Datum]) -> Result<String> {
        let body = serde_json::json!({
            "Namespace": namespace,
            "MetricData": data,
        });
        serde_json::to_string(&body)
            .map_err(|e| MetricsError::Sink(format!("Failed to serialise batch: {}", e)))
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSink for LogSink {
    async fn put_metric_data(&self, namespace: &str, data: &[Datum]) -> Result<()> {
        if log_enabled!(Level::Info) {
            info!("PutMetricData {}", Self::render(namespace, data)?);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Dimension, StandardUnit};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_uses_api_field_names() {
        let datum = Datum {
            metric_name: "reqs".to_string(),
            value: 5.0,
            unit: StandardUnit::Count,
            dimensions: vec![Dimension::new("host", "h1")],
            timestamp: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
            storage_resolution: 60,
        };

        let body: serde_json::Value =
            serde_json::from_str(&LogSink::render("nmsp", &[datum]).unwrap()).unwrap();

        assert_eq!(body["Namespace"], "nmsp");
        let first = &body["MetricData"][0];
        assert_eq!(first["MetricName"], "reqs");
        assert_eq!(first["Value"], 5.0);
        assert_eq!(first["Unit"], "Count");
        assert_eq!(first["StorageResolution"], 60);
        assert_eq!(first["Dimensions"][0]["Name"], "host");
        assert_eq!(first["Dimensions"][0]["Value"], "h1");
        assert_eq!(first["Timestamp"], "2020-01-02T03:04:05Z");
    }

    #[tokio::test]
    async fn test_put_metric_data_succeeds() {
        let sink = LogSink::new();
        assert!(sink.put_metric_data("nmsp", &[]).await.is_ok());
        assert_eq!(sink.name(), "log");
    }
}
