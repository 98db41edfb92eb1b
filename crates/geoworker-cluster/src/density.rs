//! DBSCAN-style density clustering.

use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::models::{DensityOptions, Point};
use std::collections::VecDeque;
use std::time::Instant;

use crate::distance_matrix;
use crate::result::{Cluster, ClusteringResult};

/// Cluster points whose eps-neighborhoods chain together.
///
/// A neighborhood includes the point itself. A point with at least
/// `min_pts` neighbors is a core point; clusters grow breadth-first from
/// each unlabelled core point in ascending input order and expand only
/// through core points. Everything left unlabelled is noise.
pub fn density(points: &[Point], options: &DensityOptions) -> Result<ClusteringResult> {
    let started = Instant::now();

    if options.eps.is_nan() || options.eps < 0.0 {
        return Err(GeoworkerError::invalid_options("density", "eps must be a non-negative number"));
    }
    if options.min_pts == 0 {
        return Err(GeoworkerError::invalid_options("density", "minPts must be at least 1"));
    }

    let n = points.len();
    let distances = distance_matrix(points, options.metric);
    let neighborhoods: Vec<Vec<usize>> = (0..n)
        .map(|i| (0..n).filter(|&j| distances[i][j] <= options.eps).collect())
        .collect();
    let is_core: Vec<bool> = neighborhoods.iter().map(|nb| nb.len() >= options.min_pts).collect();

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut cluster_count = 0;

    for seed in 0..n {
        if !is_core[seed] || labels[seed].is_some() {
            continue;
        }

        let cluster = cluster_count;
        cluster_count += 1;
        labels[seed] = Some(cluster);

        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            if !is_core[current] {
                continue;
            }
            for &neighbor in &neighborhoods[current] {
                if labels[neighbor].is_none() {
                    labels[neighbor] = Some(cluster);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    let mut members: Vec<Vec<Point>> = vec![Vec::new(); cluster_count];
    let mut noise = Vec::new();
    for (point, label) in points.iter().zip(&labels) {
        match label {
            Some(cluster) => members[*cluster].push(point.clone()),
            None => noise.push(point.clone()),
        }
    }

    tracing::debug!(
        eps = options.eps,
        min_pts = options.min_pts,
        clusters = cluster_count,
        noise = noise.len(),
        "density clustering finished"
    );

    let clusters = members
        .into_iter()
        .enumerate()
        .map(|(i, points)| Cluster::from_members(format!("cluster_{}", i), points))
        .collect();

    Ok(ClusteringResult::assemble("density", n, clusters, started).with_noise(noise))
}
