use crate::error::{GeoworkerError, Result};
use crate::models::cluster::{DEFAULT_MAX_ITERATIONS, DEFAULT_SEED, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Worker pool registered when nothing else is configured
pub const DEFAULT_WORKERS: [&str; 3] = ["analysis", "clustering", "data"];

/// Items processed between two progress notifications
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Defaults handed to algorithms when a request leaves an option unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmDefaults {
    pub kmeans_max_iterations: usize,
    pub kmeans_tolerance: f64,
    pub kmeans_seed: u64,
    pub progress_interval: usize,
}

impl Default for AlgorithmDefaults {
    fn default() -> Self {
        Self {
            kmeans_max_iterations: DEFAULT_MAX_ITERATIONS,
            kmeans_tolerance: DEFAULT_TOLERANCE,
            kmeans_seed: DEFAULT_SEED,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Layered configuration for geoworker
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub workers: ConfigValue<Vec<String>>,
    /// Per-task deadline in milliseconds; `None` disables timeouts
    pub task_timeout_ms: ConfigValue<Option<u64>>,
    pub kmeans_max_iterations: ConfigValue<usize>,
    pub kmeans_tolerance: ConfigValue<f64>,
    pub kmeans_seed: ConfigValue<u64>,
    pub progress_interval: ConfigValue<usize>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let defaults = AlgorithmDefaults::default();
        Self {
            workers: ConfigValue::new(
                DEFAULT_WORKERS.iter().map(|w| w.to_string()).collect(),
                ConfigSource::Default,
            ),
            task_timeout_ms: ConfigValue::new(None, ConfigSource::Default),
            kmeans_max_iterations: ConfigValue::new(
                defaults.kmeans_max_iterations,
                ConfigSource::Default,
            ),
            kmeans_tolerance: ConfigValue::new(defaults.kmeans_tolerance, ConfigSource::Default),
            kmeans_seed: ConfigValue::new(defaults.kmeans_seed, ConfigSource::Default),
            progress_interval: ConfigValue::new(defaults.progress_interval, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeoworkerError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeoworkerError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(workers) = file_config.workers {
            self.workers.update(validate_workers(workers)?, ConfigSource::File);
        }

        if let Some(timeout) = file_config.task_timeout_ms {
            self.task_timeout_ms.update(Some(timeout), ConfigSource::File);
        }

        if let Some(kmeans) = file_config.kmeans {
            if let Some(max_iterations) = kmeans.max_iterations {
                self.kmeans_max_iterations.update(max_iterations, ConfigSource::File);
            }
            if let Some(tolerance) = kmeans.tolerance {
                self.kmeans_tolerance.update(tolerance, ConfigSource::File);
            }
            if let Some(seed) = kmeans.seed {
                self.kmeans_seed.update(seed, ConfigSource::File);
            }
        }

        if let Some(interval) = file_config.progress_interval {
            if interval == 0 {
                return Err(GeoworkerError::ConfigInvalid {
                    key: "progress_interval".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            self.progress_interval.update(interval, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOWORKER_WORKERS
        if let Ok(workers_str) = env::var("GEOWORKER_WORKERS") {
            match parse_worker_list(&workers_str) {
                Ok(workers) => self.workers.update(workers, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOWORKER_WORKERS value '{}': expected comma-separated names",
                    workers_str
                ),
            }
        }

        // GEOWORKER_TASK_TIMEOUT_MS
        if let Ok(timeout_str) = env::var("GEOWORKER_TASK_TIMEOUT_MS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.task_timeout_ms.update(Some(timeout), ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOWORKER_TASK_TIMEOUT_MS value '{}': expected milliseconds",
                    timeout_str
                ),
            }
        }

        // GEOWORKER_KMEANS_SEED
        if let Ok(seed_str) = env::var("GEOWORKER_KMEANS_SEED") {
            match seed_str.parse::<u64>() {
                Ok(seed) => self.kmeans_seed.update(seed, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOWORKER_KMEANS_SEED value '{}': expected unsigned integer",
                    seed_str
                ),
            }
        }

        // GEOWORKER_PROGRESS_INTERVAL
        if let Ok(interval_str) = env::var("GEOWORKER_PROGRESS_INTERVAL") {
            match interval_str.parse::<usize>() {
                Ok(interval) if interval > 0 => {
                    self.progress_interval.update(interval, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid GEOWORKER_PROGRESS_INTERVAL value '{}': expected positive integer",
                    interval_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(workers) = overrides.workers {
            self.workers.update(workers, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.task_timeout_ms {
            self.task_timeout_ms.update(Some(timeout), ConfigSource::Cli);
        }

        if let Some(seed) = overrides.kmeans_seed {
            self.kmeans_seed.update(seed, ConfigSource::Cli);
        }
    }

    /// Task deadline, if timeouts are enabled
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.value.map(Duration::from_millis)
    }

    /// Resolved algorithm defaults
    pub fn algorithm_defaults(&self) -> AlgorithmDefaults {
        AlgorithmDefaults {
            kmeans_max_iterations: self.kmeans_max_iterations.value,
            kmeans_tolerance: self.kmeans_tolerance.value,
            kmeans_seed: self.kmeans_seed.value,
            progress_interval: self.progress_interval.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("workers".to_string(), (self.workers.value.join(","), self.workers.source));

        map.insert(
            "task_timeout_ms".to_string(),
            (
                self.task_timeout_ms
                    .value
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                self.task_timeout_ms.source,
            ),
        );

        map.insert(
            "kmeans_max_iterations".to_string(),
            (self.kmeans_max_iterations.value.to_string(), self.kmeans_max_iterations.source),
        );

        map.insert(
            "kmeans_tolerance".to_string(),
            (self.kmeans_tolerance.value.to_string(), self.kmeans_tolerance.source),
        );

        map.insert(
            "kmeans_seed".to_string(),
            (self.kmeans_seed.value.to_string(), self.kmeans_seed.source),
        );

        map.insert(
            "progress_interval".to_string(),
            (self.progress_interval.value.to_string(), self.progress_interval.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    workers: Option<Vec<String>>,
    task_timeout_ms: Option<u64>,
    progress_interval: Option<usize>,
    kmeans: Option<KMeansFileConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
struct KMeansFileConfig {
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    seed: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub workers: Option<Vec<String>>,
    pub task_timeout_ms: Option<u64>,
    pub kmeans_seed: Option<u64>,
}

/// Parse a comma-separated worker list
pub fn parse_worker_list(s: &str) -> Result<Vec<String>> {
    let workers: Vec<String> =
        s.split(',').map(|w| w.trim()).filter(|w| !w.is_empty()).map(String::from).collect();
    validate_workers(workers)
}

fn validate_workers(workers: Vec<String>) -> Result<Vec<String>> {
    if workers.is_empty() {
        return Err(GeoworkerError::ConfigInvalid {
            key: "workers".to_string(),
            reason: "at least one worker name is required".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for worker in &workers {
        if !seen.insert(worker.as_str()) {
            return Err(GeoworkerError::ConfigInvalid {
                key: "workers".to_string(),
                reason: format!("duplicate worker name '{}'", worker),
            });
        }
    }

    Ok(workers)
}
