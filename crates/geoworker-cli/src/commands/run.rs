//! Run command implementation

use crate::cli::RunArgs;
use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use crate::progress::{create_progress_bar, finish_error, finish_success};
use anyhow::{bail, Context, Result};
use geoworker_cluster::{to_feature_collection, ClusteringResult};
use geoworker_core::config::LayeredConfig;
use geoworker_core::protocol::{Task, TaskType};
use geoworker_dispatch::{Dispatcher, DispatcherOptions};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;

pub async fn execute(args: RunArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let task_type: TaskType = args.task.parse()?;
    if args.geojson.is_some() && task_type != TaskType::ClusterPoints {
        bail!("--geojson is only supported for CLUSTER_POINTS tasks");
    }

    let content = fs::read_to_string(&args.payload)
        .with_context(|| format!("Failed to read payload file {}", args.payload.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Payload file {} is not valid JSON", args.payload.display()))?;
    let task = Task::from_payload(task_type, payload)?;

    let mut dispatcher =
        Dispatcher::new(DispatcherOptions::from_config(config)).context("Failed to start worker pool")?;

    let worker = match args.worker {
        Some(worker) => worker,
        None => default_worker(task_type, &dispatcher.list_available())
            .context("No worker is configured")?,
    };

    let bar = (!output.is_json()).then(|| create_progress_bar(&format!("{} on {}", task_type, worker)));
    let started = Instant::now();
    let outcome = dispatcher
        .run_with_progress(&worker, task, |percent| {
            if let Some(bar) = &bar {
                bar.set_position(percent.round() as u64);
            }
        })
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    dispatcher.shutdown().await;

    let results = match outcome {
        Ok(results) => {
            if let Some(bar) = &bar {
                finish_success(bar, &format!("{} finished in {}ms", task_type, elapsed_ms));
            }
            results
        }
        Err(e) => {
            if let Some(bar) = &bar {
                finish_error(bar, &format!("{} failed", task_type));
            }
            return Err(e).with_context(|| format!("Task {} failed on worker '{}'", task_type, worker));
        }
    };

    let geojson = match &args.geojson {
        Some(path) => {
            write_geojson(&results, path)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    if output.is_json() {
        output.result(RunOutput {
            completion_type: task_type.completion_type(),
            worker,
            elapsed_ms,
            geojson,
            results,
        })?;
    } else {
        output.section("Task Result");
        output.kv("Type", task_type.completion_type());
        output.kv("Worker", &worker);
        output.kv("Elapsed", format!("{}ms", elapsed_ms));
        if let Some(path) = geojson {
            output.kv("GeoJSON", path);
        }
        output.data(&results)?;
    }

    Ok(())
}

/// Worker conventionally serving a task type, falling back to the first idle one
fn default_worker(task_type: TaskType, available: &[String]) -> Option<String> {
    let preferred = match task_type {
        TaskType::ClusterPoints | TaskType::SpatialAnalysis => "clustering",
        TaskType::ValidateData
        | TaskType::CleanData
        | TaskType::TransformData
        | TaskType::AggregateData => "data",
        TaskType::AnalyzeSites
        | TaskType::CalculateDistances
        | TaskType::ScoreSites
        | TaskType::ApplyFilters => "analysis",
    };
    available
        .iter()
        .find(|name| name.as_str() == preferred)
        .or_else(|| available.first())
        .cloned()
}

fn write_geojson(results: &Value, path: &Path) -> Result<()> {
    let clustering: ClusteringResult =
        serde_json::from_value(results.clone()).context("Results are not a clustering result")?;
    let collection = to_feature_collection(&clustering);
    let content = serde_json::to_string_pretty(&collection)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), features = collection.features.len(), "wrote GeoJSON");
    Ok(())
}
