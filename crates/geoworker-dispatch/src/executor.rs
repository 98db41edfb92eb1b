//! Mapping from typed tasks to the algorithm crates.

use geoworker_cluster::cluster_points;
use geoworker_core::config::AlgorithmDefaults;
use geoworker_core::error::Result;
use geoworker_core::models::ClusterOptions;
use geoworker_core::protocol::Task;
use geoworker_data::{aggregate, clean, transform, validate_with_progress};
use geoworker_scoring::{analyze_sites, calculate_distances, filter_sites, rank_sites};
use serde::Serialize;
use serde_json::Value;

/// Runs one task to completion on a worker.
///
/// Implementations execute on a blocking thread. `progress` accepts percent
/// complete in `0.0..=100.0` and may be called any number of times before
/// the result is returned.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: Task, progress: &mut dyn FnMut(f64)) -> Result<Value>;
}

/// Executor backed by the clustering, spatial, scoring and data crates
#[derive(Debug, Clone, Default)]
pub struct AlgorithmExecutor {
    defaults: AlgorithmDefaults,
}

impl AlgorithmExecutor {
    pub fn new(defaults: AlgorithmDefaults) -> Self {
        Self { defaults }
    }

    /// Fill unset k-means options from the configured defaults
    fn apply_defaults(&self, options: &mut ClusterOptions) {
        if let ClusterOptions::Kmeans(kmeans) = options {
            kmeans.max_iterations.get_or_insert(self.defaults.kmeans_max_iterations);
            kmeans.tolerance.get_or_insert(self.defaults.kmeans_tolerance);
            kmeans.seed.get_or_insert(self.defaults.kmeans_seed);
        }
    }
}

impl TaskExecutor for AlgorithmExecutor {
    fn execute(&self, task: Task, progress: &mut dyn FnMut(f64)) -> Result<Value> {
        match task {
            Task::AnalyzeSites(request) => encode(&analyze_sites(&request)),
            Task::CalculateDistances(request) => encode(&calculate_distances(&request)),
            Task::ScoreSites(request) => encode(&rank_sites(&request.sites, &request.criteria)),
            Task::ApplyFilters(request) => encode(&filter_sites(&request.sites, &request.filters)),
            Task::ValidateData(request) => encode(&validate_with_progress(
                &request.dataset,
                &request.schema,
                self.defaults.progress_interval,
                |percent| progress(percent),
            )),
            Task::CleanData(request) => encode(&clean(&request.dataset, &request.rules)),
            Task::TransformData(request) => {
                encode(&transform(&request.dataset, &request.transformations))
            }
            Task::AggregateData(request) => {
                encode(&aggregate(&request.dataset, &request.group_by, &request.calculations))
            }
            Task::ClusterPoints(mut request) => {
                self.apply_defaults(&mut request.options);
                encode(&cluster_points(&request)?)
            }
            Task::SpatialAnalysis(request) => encode(&geoworker_geo::analyze(&request)?),
        }
    }
}

fn encode<T: Serialize>(results: &T) -> Result<Value> {
    Ok(serde_json::to_value(results)?)
}
