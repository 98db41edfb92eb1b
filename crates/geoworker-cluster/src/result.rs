use geoworker_core::models::{Coordinate, Point};
use geoworker_geo::spatial::mean_coordinate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A group of points sharing a computed label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub label: String,
    pub points: Vec<Point>,
    /// Mean of the member coordinates, or the last known centre for an empty k-means cluster
    pub centroid: Coordinate,
}

impl Cluster {
    /// Build a cluster whose centroid is the mean of its members
    pub(crate) fn from_members(label: String, points: Vec<Point>) -> Self {
        let coords: Vec<Coordinate> = points.iter().map(|p| p.coordinates()).collect();
        let centroid = mean_coordinate(&coords).unwrap_or([0.0, 0.0]);
        Self { label, points, centroid }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One agglomerative merge.
///
/// Leaves are numbered `0..n` by input position; the cluster created by the
/// `i`-th merge is numbered `n + i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DendrogramStep {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub cluster: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub algorithm: String,
    pub point_count: usize,
    pub cluster_count: usize,
    pub noise_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    pub elapsed_ms: u64,
}

/// Output of every clustering algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub clusters: Vec<Cluster>,
    pub centroids: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dendrogram: Vec<DendrogramStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub noise: Vec<Point>,
    pub metadata: ClusterMetadata,
}

impl ClusteringResult {
    /// Assemble a result, deriving centroids and counts from the clusters
    pub(crate) fn assemble(
        algorithm: &str,
        point_count: usize,
        clusters: Vec<Cluster>,
        started: Instant,
    ) -> Self {
        let centroids = clusters.iter().map(|c| c.centroid).collect();
        let metadata = ClusterMetadata {
            algorithm: algorithm.to_string(),
            point_count,
            cluster_count: clusters.len(),
            noise_count: 0,
            iterations: None,
            converged: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        Self { clusters, centroids, dendrogram: Vec::new(), noise: Vec::new(), metadata }
    }

    pub(crate) fn with_iterations(mut self, iterations: usize, converged: bool) -> Self {
        self.metadata.iterations = Some(iterations);
        self.metadata.converged = Some(converged);
        self
    }

    pub(crate) fn with_dendrogram(mut self, dendrogram: Vec<DendrogramStep>) -> Self {
        self.dendrogram = dendrogram;
        self
    }

    pub(crate) fn with_noise(mut self, noise: Vec<Point>) -> Self {
        self.metadata.noise_count = noise.len();
        self.noise = noise;
        self
    }

    /// Total points across clusters and noise
    pub fn assigned_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum::<usize>() + self.noise.len()
    }
}
