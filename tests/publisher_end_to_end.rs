use async_trait::async_trait;
use cloudmetrics::prelude::*;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Registry backed by a fixed list, visited in insertion order
struct FixedRegistry {
    metrics: Vec<(String, Arc<dyn Metric>)>,
}

impl Registry for FixedRegistry {
    fn each(&self, visit: &mut dyn FnMut(&str, &dyn Metric)) -> Result<()> {
        for (name, metric) in &self.metrics {
            visit(name, metric.as_ref());
        }
        Ok(())
    }
}

/// Sink that keeps the rendered request bodies
#[derive(Default)]
struct JsonSink {
    requests: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl MetricSink for JsonSink {
    async fn put_metric_data(&self, namespace: &str, data: &[Datum]) -> Result<()> {
        let body = serde_json::json!({ "Namespace": namespace, "MetricData": data });
        self.requests.lock().unwrap().push(body);
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[tokio::test(start_paused = true)]
async fn test_configured_publisher_end_to_end() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
interval_secs = 10
percentiles = [0.5, 0.99]

[units]
latency = "Seconds"

[dimensions]
service = "checkout"
"#
    )
    .unwrap();

    let requests = Arc::new(Counter::new());
    requests.inc(5);
    let latency = Arc::new(Timer::new());
    latency.update(Duration::from_millis(200));

    let registry = Arc::new(FixedRegistry {
        metrics: vec![
            ("requests".to_string(), requests as Arc<dyn Metric>),
            ("latency".to_string(), latency as Arc<dyn Metric>),
        ],
    });

    let sink = Arc::new(JsonSink::default());
    let publisher = Publisher::builder(registry, "shop")
        .settings(load_settings(file.path()).unwrap())
        .sink(sink.clone())
        .build()
        .unwrap();
    let shutdown = publisher.shutdown_token();
    let handle = publisher.spawn();

    tokio::time::sleep(Duration::from_secs(15)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let bodies = sink.requests.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["Namespace"], "shop");

    let data = bodies[0]["MetricData"].as_array().unwrap();
    let summary: Vec<_> = data
        .iter()
        .map(|d| {
            (
                d["MetricName"].as_str().unwrap().to_string(),
                d["Value"].as_f64().unwrap(),
                d["Unit"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("requests".to_string(), 5.0, "Count".to_string()),
            ("latency.count".to_string(), 1.0, "Count".to_string()),
            ("latency.p50".to_string(), 0.2, "Seconds".to_string()),
            ("latency.p99".to_string(), 0.2, "Seconds".to_string()),
        ]
    );

    for datum in data {
        assert_eq!(datum["Dimensions"][0]["Name"], "service");
        assert_eq!(datum["Dimensions"][0]["Value"], "checkout");
        assert_eq!(datum["StorageResolution"], 60);
        assert_eq!(datum["Timestamp"], data[0]["Timestamp"]);
    }
}

#[tokio::test]
async fn test_memory_sink_batches_large_registry() {
    let registry = Arc::new(MetricsRegistry::new());
    for i in 0..9 {
        let timer = Timer::new();
        timer.update(Duration::from_micros(100 * (i + 1)));
        registry.register(format!("op{}", i), Arc::new(timer)).unwrap();
    }

    let sink = Arc::new(MemorySink::new());
    let publisher = Publisher::builder(registry, "ops")
        .sink(sink.clone())
        .build()
        .unwrap();

    // 9 timers * (count + 4 percentiles)
    let data = publisher.poll_once();
    assert_eq!(data.len(), 45);

    publisher.publish_metrics(&data).await;
    let sizes: Vec<_> = sink.batches().iter().map(|b| b.data.len()).collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(sink.data(), data);
}
