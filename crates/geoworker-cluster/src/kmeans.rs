//! Lloyd's k-means over planar coordinates.

use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::models::{Coordinate, KMeansOptions, Point};
use geoworker_geo::euclidean_distance;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::result::{Cluster, ClusteringResult};

const ALGORITHM: &str = "kmeans";

/// k-means seeded from `options.seed` (or the crate default seed)
pub fn kmeans(points: &[Point], options: &KMeansOptions) -> Result<ClusteringResult> {
    let mut rng = StdRng::seed_from_u64(options.seed_or_default());
    kmeans_with_rng(points, options, &mut rng)
}

/// k-means drawing its initial centroids from the supplied generator.
///
/// When there are no more points than `k`, every point becomes its own
/// cluster and no iteration runs. Otherwise `k` distinct input points seed
/// the centroids and the assign/update loop runs until every centroid moves
/// less than the tolerance or `max_iterations` is reached. A centroid whose
/// cluster empties keeps its previous position.
pub fn kmeans_with_rng<R: Rng + ?Sized>(
    points: &[Point],
    options: &KMeansOptions,
    rng: &mut R,
) -> Result<ClusteringResult> {
    let started = Instant::now();
    let k = options.k;
    let max_iterations = options.max_iterations_or_default();
    let tolerance = options.tolerance_or_default();

    if k == 0 {
        return Err(GeoworkerError::invalid_options(ALGORITHM, "k must be at least 1"));
    }
    if max_iterations == 0 {
        return Err(GeoworkerError::invalid_options(ALGORITHM, "maxIterations must be at least 1"));
    }
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GeoworkerError::invalid_options(
            ALGORITHM,
            "tolerance must be a non-negative number",
        ));
    }

    let n = points.len();
    if n <= k {
        let clusters = points
            .iter()
            .enumerate()
            .map(|(i, p)| Cluster::from_members(label(i), vec![p.clone()]))
            .collect();
        return Ok(ClusteringResult::assemble(ALGORITHM, n, clusters, started).with_iterations(0, true));
    }

    let coords: Vec<Coordinate> = points.iter().map(|p| p.coordinates()).collect();
    let mut centroids: Vec<Coordinate> =
        rand::seq::index::sample(rng, n, k).iter().map(|i| coords[i]).collect();
    let mut assignments = vec![0usize; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        for (slot, coord) in assignments.iter_mut().zip(&coords) {
            *slot = nearest_centroid(*coord, &centroids);
        }

        let updated = recompute_centroids(&coords, &assignments, &centroids);
        let max_shift = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| euclidean_distance(*old, *new))
            .fold(0.0, f64::max);
        centroids = updated;

        if max_shift < tolerance {
            converged = true;
            break;
        }
    }

    tracing::debug!(k, points = n, iterations, converged, "k-means finished");

    let mut members: Vec<Vec<Point>> = vec![Vec::new(); k];
    for (point, &cluster) in points.iter().zip(&assignments) {
        members[cluster].push(point.clone());
    }

    let clusters = members
        .into_iter()
        .zip(&centroids)
        .enumerate()
        .map(|(i, (points, centroid))| Cluster { label: label(i), points, centroid: *centroid })
        .collect();

    Ok(ClusteringResult::assemble(ALGORITHM, n, clusters, started)
        .with_iterations(iterations, converged))
}

fn label(index: usize) -> String {
    format!("cluster_{}", index)
}

/// Index of the closest centroid; ties go to the lowest index
fn nearest_centroid(coord: Coordinate, centroids: &[Coordinate]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = euclidean_distance(coord, *centroid);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

fn recompute_centroids(
    coords: &[Coordinate],
    assignments: &[usize],
    previous: &[Coordinate],
) -> Vec<Coordinate> {
    let mut sums = vec![[0.0, 0.0]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (coord, &cluster) in coords.iter().zip(assignments) {
        sums[cluster][0] += coord[0];
        sums[cluster][1] += coord[1];
        counts[cluster] += 1;
    }

    sums.iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                [sum[0] / count as f64, sum[1] / count as f64]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Point> {
        vec![
            Point::new("a1", 0.0, 0.0),
            Point::new("a2", 0.1, 0.0),
            Point::new("a3", 0.0, 0.1),
            Point::new("b1", 10.0, 10.0),
            Point::new("b2", 10.1, 10.0),
            Point::new("b3", 10.0, 10.1),
        ]
    }

    #[test]
    fn test_separates_two_blobs() {
        let result = kmeans(&two_blobs(), &KMeansOptions::new(2).with_seed(7)).unwrap();

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.metadata.converged, Some(true));
        for cluster in &result.clusters {
            assert_eq!(cluster.len(), 3);
            let prefix = &cluster.points[0].id()[..1];
            assert!(cluster.points.iter().all(|p| p.id().starts_with(prefix)));
        }
    }

    #[test]
    fn test_fallback_when_k_not_below_n() {
        let points = two_blobs();
        let result = kmeans(&points, &KMeansOptions::new(10)).unwrap();

        assert_eq!(result.clusters.len(), points.len());
        assert!(result.clusters.iter().all(|c| c.len() == 1));
        assert_eq!(result.metadata.iterations, Some(0));

        let exact = kmeans(&points, &KMeansOptions::new(points.len())).unwrap();
        assert_eq!(exact.metadata.iterations, Some(0));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let options = KMeansOptions::new(3).with_seed(1234);
        let first = kmeans(&two_blobs(), &options).unwrap();
        let second = kmeans(&two_blobs(), &options).unwrap();
        assert_eq!(first.clusters, second.clusters);
        assert_eq!(first.centroids, second.centroids);
    }

    #[test]
    fn test_identical_points_leave_empty_clusters() {
        let points: Vec<Point> = (0..5).map(|i| Point::new(format!("p{}", i), 1.0, 1.0)).collect();
        let result = kmeans(&points, &KMeansOptions::new(3).with_seed(3)).unwrap();

        assert_eq!(result.clusters.len(), 3);
        assert_eq!(result.clusters.iter().map(Cluster::len).sum::<usize>(), 5);
        // Ties go to the lowest index, so everything lands in cluster 0
        assert_eq!(result.clusters[0].len(), 5);
        assert_eq!(result.clusters[1].centroid, [1.0, 1.0]);
    }

    #[test]
    fn test_max_iterations_caps_loop() {
        let options = KMeansOptions::new(2).with_seed(7).with_max_iterations(1).with_tolerance(0.0);
        let result = kmeans(&two_blobs(), &options).unwrap();
        assert_eq!(result.metadata.iterations, Some(1));
    }

    #[test]
    fn test_invalid_options() {
        assert!(kmeans(&two_blobs(), &KMeansOptions::new(0)).is_err());
        assert!(kmeans(&two_blobs(), &KMeansOptions::new(2).with_max_iterations(0)).is_err());
        assert!(kmeans(&two_blobs(), &KMeansOptions::new(2).with_tolerance(-1.0)).is_err());
    }

    #[test]
    fn test_nearest_centroid_tie_breaks_low() {
        let centroids = [[1.0, 0.0], [-1.0, 0.0]];
        assert_eq!(nearest_centroid([0.0, 0.0], &centroids), 0);
    }
}
