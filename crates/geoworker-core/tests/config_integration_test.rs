//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geoworker_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 4] = [
    "GEOWORKER_WORKERS",
    "GEOWORKER_TASK_TIMEOUT_MS",
    "GEOWORKER_KMEANS_SEED",
    "GEOWORKER_PROGRESS_INTERVAL",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.workers.value.len(), 3);
    assert_eq!(config.workers.source, ConfigSource::Default);
    assert_eq!(config.task_timeout(), None);
    assert_eq!(config.kmeans_seed.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("GEOWORKER_WORKERS", "east, west");
    env::set_var("GEOWORKER_TASK_TIMEOUT_MS", "250");
    env::set_var("GEOWORKER_KMEANS_SEED", "1234");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
workers = ["file-worker"]
task_timeout_ms = 10000

[kmeans]
seed = 5
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.workers.value, vec!["east", "west"]);
    assert_eq!(config.workers.source, ConfigSource::Environment);
    assert_eq!(config.task_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.kmeans_seed.value, 1234);
    assert_eq!(config.kmeans_seed.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_ignored() {
    clear_env();
    env::set_var("GEOWORKER_TASK_TIMEOUT_MS", "soon");
    env::set_var("GEOWORKER_PROGRESS_INTERVAL", "0");
    env::set_var("GEOWORKER_WORKERS", " , ");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.task_timeout_ms.source, ConfigSource::Default);
    assert_eq!(config.progress_interval.value, 100);
    assert_eq!(config.workers.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("GEOWORKER_KMEANS_SEED", "11");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[kmeans]\nseed = 3").unwrap();

    let mut config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    // At this point, environment should have overridden file
    assert_eq!(config.kmeans_seed.value, 11);
    assert_eq!(config.kmeans_seed.source, ConfigSource::Environment);

    // Now CLI should override environment
    config.update_from_cli(CliConfigOverrides { kmeans_seed: Some(2), ..Default::default() });

    assert_eq!(config.kmeans_seed.value, 2);
    assert_eq!(config.kmeans_seed.source, ConfigSource::Cli);
    assert_eq!(config.algorithm_defaults().kmeans_seed, 2);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_missing_file_is_config_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geoworker.toml");
    assert!(result.is_err());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "workers = [unterminated").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(result.is_err());
}
