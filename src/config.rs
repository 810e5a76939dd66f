use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::datum::{BuilderConfig, DEFAULT_PERCENTILES, DEFAULT_STORAGE_RESOLUTION, StandardUnit};
use crate::error::{MetricsError, Result};

/// Default time between two publish cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Most data points the monitoring API accepts in one call
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Longest accepted publish interval
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 3600);

/// Resolved publisher settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time between two publish cycles
    pub interval: Duration,
    /// Unit to report for a metric, by metric name
    pub units: HashMap<String, StandardUnit>,
    /// Dimensions attached to every data point
    pub dimensions: BTreeMap<String, String>,
    /// Percentiles reported for histograms and timers
    pub percentiles: Vec<f64>,
    /// Storage resolution in seconds
    pub storage_resolution: i64,
    /// Upper bound on data points per submission
    pub max_batch_size: usize,
    /// Give up on a single submission after this long
    pub submit_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            units: HashMap::new(),
            dimensions: BTreeMap::new(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            storage_resolution: DEFAULT_STORAGE_RESOLUTION,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            submit_timeout: None,
        }
    }
}

impl Settings {
    /// Apply overrides to the defaults, in order
    pub fn merged(overrides: impl IntoIterator<Item = SettingsOverride>) -> Self {
        let mut settings = Self::default();
        for o in overrides {
            settings.apply(o);
        }
        settings
    }

    /// Apply one override
    ///
    /// Scalars and lists are replaced, units are merged key by key with the
    /// override winning, dimensions are replaced as a whole.
    pub fn apply(&mut self, o: SettingsOverride) {
        if let Some(interval) = o.interval {
            self.interval = interval;
        }
        if let Some(units) = o.units {
            self.units.extend(units);
        }
        if let Some(dimensions) = o.dimensions {
            self.dimensions = dimensions;
        }
        if let Some(percentiles) = o.percentiles {
            self.percentiles = percentiles;
        }
        if let Some(storage_resolution) = o.storage_resolution {
            self.storage_resolution = storage_resolution;
        }
        if let Some(max_batch_size) = o.max_batch_size {
            self.max_batch_size = max_batch_size;
        }
        if let Some(submit_timeout) = o.submit_timeout {
            self.submit_timeout = Some(submit_timeout);
        }
    }

    /// Check the settings that the datum builder does not cover
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MetricsError::Config("interval must be positive".to_string()));
        }
        if self.interval > MAX_INTERVAL {
            return Err(MetricsError::Config(format!(
                "interval must not exceed {:?}",
                MAX_INTERVAL
            )));
        }
        if self.max_batch_size == 0 {
            return Err(MetricsError::Config("max_batch_size must be positive".to_string()));
        }
        if self.submit_timeout.is_some_and(|t| t.is_zero()) {
            return Err(MetricsError::Config("submit_timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Datum builder configuration derived from these settings
    pub fn builder_config(&self) -> Result<BuilderConfig> {
        BuilderConfig::new(
            self.units.clone(),
            self.dimensions.clone(),
            self.percentiles.clone(),
            self.storage_resolution,
        )
    }
}

/// A partial set of settings; unset fields leave the current value alone
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsOverride {
    #[serde(rename = "interval_secs", deserialize_with = "de_opt_secs")]
    pub interval: Option<Duration>,
    pub units: Option<HashMap<String, StandardUnit>>,
    pub dimensions: Option<BTreeMap<String, String>>,
    pub percentiles: Option<Vec<f64>>,
    pub storage_resolution: Option<i64>,
    pub max_batch_size: Option<usize>,
    #[serde(rename = "submit_timeout_secs", deserialize_with = "de_opt_secs")]
    pub submit_timeout: Option<Duration>,
}

fn de_opt_secs<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
}

/// Helper function to load configuration from various sources
///
/// Later sources override earlier ones. Missing files are skipped with a
/// warning.
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    continue;
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder
                    .add_source(config::File::from(path.as_path()).format(config::FileFormat::Toml));
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .separator("__")
                        .try_parsing(true),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder = builder
                    .add_source(config::File::from_str(&toml_str, config::FileFormat::Toml));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| MetricsError::Config(format!("Failed to build configuration: {}", e)))?;

    let result = config
        .try_deserialize()
        .map_err(|e| MetricsError::Config(format!("Failed to deserialize configuration: {}", e)))?;

    debug!("Configuration loaded successfully: {:?}", result);

    Ok(result)
}

/// Configuration builder
pub struct ConfigBuilder<T: for<'de> Deserialize<'de>> {
    sources: Vec<ConfigSource>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: for<'de> Deserialize<'de> + Debug> ConfigBuilder<T> {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a TOML file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<T> {
        load_config::<T>(self.sources)
    }
}

impl<T: for<'de> Deserialize<'de> + Debug> Default for ConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a settings override from a TOML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<SettingsOverride> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MetricsError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    ConfigBuilder::<SettingsOverride>::new().add_file(path).build()
}
