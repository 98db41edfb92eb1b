//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geoworker_core::config::{parse_worker_list, CliConfigOverrides, LayeredConfig};

use crate::cli::Cli;

/// Resolve configuration: defaults, then the optional file, then environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &cli.config {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(overrides(cli)?);
    Ok(config)
}

fn overrides(cli: &Cli) -> Result<CliConfigOverrides> {
    let workers = cli
        .workers
        .as_deref()
        .map(parse_worker_list)
        .transpose()
        .context("Invalid --workers value")?;

    Ok(CliConfigOverrides { workers, task_timeout_ms: cli.timeout_ms, kmeans_seed: cli.seed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use geoworker_core::config::ConfigSource;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["geoworker", "--workers", "a,b", "--timeout-ms", "250", "workers"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.workers.value, vec!["a", "b"]);
        assert_eq!(config.workers.source, ConfigSource::Cli);
        assert_eq!(config.task_timeout_ms.value, Some(250));
    }

    #[test]
    fn test_duplicate_worker_flag_rejected() {
        let cli = Cli::parse_from(["geoworker", "--workers", "a,a", "workers"]);
        assert!(load_config(&cli).is_err());
    }
}
