//! Clustering request models.

use serde::{Deserialize, Serialize};

use super::point::Point;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_SEED: u64 = 42;

/// Payload of a `CLUSTER_POINTS` task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub points: Vec<Point>,
    pub options: ClusterOptions,
}

/// Algorithm selection, keyed by the options `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClusterOptions {
    Kmeans(KMeansOptions),
    Grid(GridOptions),
    Hierarchical(HierarchicalOptions),
    Density(DensityOptions),
}

/// k-means options. Unset fields fall back to configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KMeansOptions {
    pub k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Seed for centroid initialisation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl KMeansOptions {
    pub fn new(k: usize) -> Self {
        Self { k, max_iterations: None, tolerance: None, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn max_iterations_or_default(&self) -> usize {
        self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS)
    }

    pub fn tolerance_or_default(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }

    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOptions {
    /// Cell edge length in coordinate degrees
    pub cell_size: f64,
}

/// Inter-cluster distance rule for agglomerative clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Nearest pair of members
    #[default]
    Single,
    /// Farthest pair of members
    Complete,
    /// Mean over all member pairs
    Average,
}

/// Point-to-point distance used by hierarchical and density clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Great-circle distance in meters
    #[default]
    Haversine,
    /// Planar distance in coordinate units
    Euclidean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalOptions {
    #[serde(default)]
    pub linkage: Linkage,
    pub max_distance: f64,
    #[serde(default)]
    pub metric: DistanceMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityOptions {
    pub eps: f64,
    pub min_pts: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
}
