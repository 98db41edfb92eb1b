//! Agglomerative clustering with single, complete or average linkage.
//!
//! Inter-cluster distances are kept in a matrix and updated with the
//! Lance-Williams rule after each merge. Merge distances never decrease under
//! single or complete linkage; average linkage gives no such guarantee.

use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::models::{HierarchicalOptions, Linkage, Point};
use std::time::Instant;

use crate::distance_matrix;
use crate::result::{Cluster, ClusteringResult, DendrogramStep};

struct Active {
    /// Dendrogram node id
    node: usize,
    members: Vec<usize>,
}

pub fn hierarchical(points: &[Point], options: &HierarchicalOptions) -> Result<ClusteringResult> {
    let started = Instant::now();
    let max_distance = options.max_distance;

    if max_distance.is_nan() || max_distance < 0.0 {
        return Err(GeoworkerError::invalid_options(
            "hierarchical",
            "maxDistance must be a non-negative number",
        ));
    }

    let n = points.len();
    let mut distances = distance_matrix(points, options.metric);
    let mut active: Vec<Option<Active>> =
        (0..n).map(|i| Some(Active { node: i, members: vec![i] })).collect();
    let mut dendrogram = Vec::new();

    while let Some((i, j, distance)) = closest_pair(&active, &distances) {
        if distance > max_distance {
            break;
        }

        let (Some(left), Some(right)) = (active[i].take(), active[j].take()) else {
            break;
        };
        let (left_size, right_size) = (left.members.len(), right.members.len());

        for k in 0..n {
            if k == i || k == j || active[k].is_none() {
                continue;
            }
            let merged = linkage_update(
                options.linkage,
                distances[i][k],
                distances[j][k],
                left_size,
                right_size,
            );
            distances[i][k] = merged;
            distances[k][i] = merged;
        }

        let node = n + dendrogram.len();
        dendrogram.push(DendrogramStep {
            left: left.node,
            right: right.node,
            distance,
            cluster: node,
            size: left_size + right_size,
        });

        let mut members = left.members;
        members.extend(right.members);
        members.sort_unstable();
        active[i] = Some(Active { node, members });
    }

    tracing::debug!(
        linkage = ?options.linkage,
        points = n,
        merges = dendrogram.len(),
        "hierarchical clustering finished"
    );

    let mut groups: Vec<Active> = active.into_iter().flatten().collect();
    groups.sort_by_key(|group| group.members[0]);

    let clusters = groups
        .into_iter()
        .map(|group| {
            let members = group.members.iter().map(|&m| points[m].clone()).collect();
            Cluster::from_members(format!("node_{}", group.node), members)
        })
        .collect();

    Ok(ClusteringResult::assemble("hierarchical", n, clusters, started).with_dendrogram(dendrogram))
}

/// Closest pair of live clusters, ties resolved by lowest `(i, j)`
fn closest_pair(active: &[Option<Active>], distances: &[Vec<f64>]) -> Option<(usize, usize, f64)> {
    let live: Vec<usize> = (0..active.len()).filter(|&i| active[i].is_some()).collect();
    let mut best: Option<(usize, usize, f64)> = None;

    for (a, &i) in live.iter().enumerate() {
        for &j in &live[a + 1..] {
            let d = distances[i][j];
            if best.map_or(true, |(_, _, current)| d < current) {
                best = Some((i, j, d));
            }
        }
    }
    best
}

/// Distance from the union of two clusters to a third
fn linkage_update(linkage: Linkage, d_left: f64, d_right: f64, left: usize, right: usize) -> f64 {
    match linkage {
        Linkage::Single => d_left.min(d_right),
        Linkage::Complete => d_left.max(d_right),
        Linkage::Average => {
            let total = (left + right) as f64;
            (d_left * left as f64 + d_right * right as f64) / total
        }
    }
}
