// Publish a timer and a counter to the log every few seconds

use clap::Parser;
use cloudmetrics::config::{LogLevel, load_settings};
use cloudmetrics::prelude::*;
use cloudmetrics::util::logging;
use log::{error, info};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Command line arguments for the simple example
#[derive(Parser, Debug)]
#[command(name = "simple", about = "cloudmetrics publishing example")]
struct Args {
    /// Namespace the metrics are published under
    #[arg(short, long, default_value = "cloudmetrics/simple")]
    namespace: String,

    /// Interval between publish cycles in seconds, overriding the config file
    #[arg(short, long)]
    interval: Option<u64>,

    /// Optional TOML file with publisher settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let registry = Arc::new(MetricsRegistry::new());
    let work = Arc::new(Timer::new());
    let loops = Arc::new(Counter::new());
    registry.register("sample", work.clone())?;
    registry.register("loops", loops.clone())?;

    let hostname = hostname::get()?.to_string_lossy().into_owned();

    let mut builder = Publisher::builder(registry, args.namespace)
        .interval(Duration::from_secs(5))
        .unit("sample", StandardUnit::Microseconds)
        .sink(Arc::new(LogSink::new()));

    if let Some(path) = &args.config {
        match load_settings(path) {
            Ok(overrides) => {
                info!("Configuration loaded from {}", path.display());
                builder = builder.settings(overrides);
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                return Err(e.into());
            }
        }
    }

    if let Some(secs) = args.interval {
        builder = builder.interval(Duration::from_secs(secs));
    }

    let publisher = builder.dimension("Host", hostname).build()?;
    let shutdown = publisher.shutdown_token();

    info!(
        "Publishing to {} every {:?}",
        publisher.namespace(),
        publisher.interval()
    );
    let handle = publisher.spawn();

    let generator = tokio::spawn(async move {
        loop {
            let pause = Duration::from_millis(rand::rng().random_range(5..50));
            let start = Instant::now();
            tokio::time::sleep(pause).await;
            work.update_since(start);
            loops.inc(1);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt signal, shutting down...");

    generator.abort();
    shutdown.cancel();
    handle.await?;

    info!("Publisher stopped");
    Ok(())
}
