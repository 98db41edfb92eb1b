//! geoworker Cluster - Point clustering algorithms
//!
//! k-means, grid, agglomerative hierarchical and density-based (DBSCAN-style)
//! clustering over located points. Every algorithm returns a
//! [`ClusteringResult`] holding the clusters, their centroids, the dendrogram
//! (hierarchical only), the noise set (density only) and run metadata.

pub mod density;
pub mod export;
pub mod grid;
pub mod hierarchical;
pub mod kmeans;
pub mod result;

use geoworker_core::error::Result;
use geoworker_core::models::{ClusterOptions, ClusterRequest, Coordinate, DistanceMetric, Point};
use geoworker_geo::{euclidean_distance, haversine_distance};

pub use density::density;
pub use export::to_feature_collection;
pub use grid::grid;
pub use hierarchical::hierarchical;
pub use kmeans::{kmeans, kmeans_with_rng};
pub use result::{Cluster, ClusterMetadata, ClusteringResult, DendrogramStep};

/// Run the algorithm selected by the request options
pub fn cluster_points(request: &ClusterRequest) -> Result<ClusteringResult> {
    match &request.options {
        ClusterOptions::Kmeans(opts) => kmeans(&request.points, opts),
        ClusterOptions::Grid(opts) => grid(&request.points, opts),
        ClusterOptions::Hierarchical(opts) => hierarchical(&request.points, opts),
        ClusterOptions::Density(opts) => density(&request.points, opts),
    }
}

/// Distance between two coordinates under the chosen metric
pub(crate) fn metric_distance(metric: DistanceMetric, a: Coordinate, b: Coordinate) -> f64 {
    match metric {
        DistanceMetric::Haversine => haversine_distance(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
    }
}

/// Full symmetric point-to-point distance matrix
pub(crate) fn distance_matrix(points: &[Point], metric: DistanceMetric) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = metric_distance(metric, points[i].coordinates(), points[j].coordinates());
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}
