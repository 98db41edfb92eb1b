//! Property tests for the clustering algorithms

use geoworker_cluster::{density, grid, hierarchical, kmeans, ClusteringResult};
use geoworker_core::models::{
    DensityOptions, DistanceMetric, GridOptions, HierarchicalOptions, KMeansOptions, Linkage, Point,
};
use geoworker_geo::euclidean_distance;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn points(max: usize) -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 0..max).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lon, lat))| Point::new(format!("p{}", i), lon, lat))
            .collect()
    })
}

/// Every input id appears exactly once across clusters and noise
fn assert_partition(result: &ClusteringResult, input: &[Point]) -> Result<(), TestCaseError> {
    let mut seen = BTreeSet::new();
    for point in result.clusters.iter().flat_map(|c| &c.points).chain(&result.noise) {
        prop_assert!(seen.insert(point.id().to_string()), "{} assigned twice", point.id());
    }
    prop_assert_eq!(seen.len(), input.len());
    Ok(())
}

proptest! {
    #[test]
    fn kmeans_partitions_into_k_clusters(input in points(40), k in 1usize..6, seed in any::<u64>()) {
        let result = kmeans(&input, &KMeansOptions::new(k).with_seed(seed)).unwrap();
        assert_partition(&result, &input)?;
        if input.len() > k {
            prop_assert_eq!(result.clusters.len(), k);
        } else {
            prop_assert_eq!(result.clusters.len(), input.len());
            prop_assert_eq!(result.metadata.iterations, Some(0));
        }
    }

    #[test]
    fn grid_is_deterministic_partition(input in points(40), cell_size in 0.1f64..5.0) {
        let options = GridOptions { cell_size };
        let first = grid(&input, &options).unwrap();
        let second = grid(&input, &options).unwrap();
        assert_partition(&first, &input)?;
        prop_assert_eq!(first.clusters, second.clusters);
    }

    #[test]
    fn monotone_linkages_never_decrease(
        input in points(20),
        max_distance in 0.0f64..20.0,
        complete in any::<bool>(),
    ) {
        let linkage = if complete { Linkage::Complete } else { Linkage::Single };
        let options = HierarchicalOptions { linkage, max_distance, metric: DistanceMetric::Euclidean };
        let result = hierarchical(&input, &options).unwrap();

        assert_partition(&result, &input)?;
        prop_assert!(result.clusters.len() <= input.len());
        prop_assert_eq!(result.clusters.len() + result.dendrogram.len(), input.len());
        for pair in result.dendrogram.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
        for step in &result.dendrogram {
            prop_assert!(step.distance <= max_distance);
        }
    }

    #[test]
    fn density_members_are_reachable(input in points(30), eps in 0.1f64..3.0, min_pts in 1usize..5) {
        let options = DensityOptions { eps, min_pts, metric: DistanceMetric::Euclidean };
        let result = density(&input, &options).unwrap();

        assert_partition(&result, &input)?;
        prop_assert_eq!(result.noise.len() + result.clusters.iter().map(|c| c.len()).sum::<usize>(), input.len());

        let neighbors = |p: &Point| {
            input.iter().filter(|q| euclidean_distance(p.coordinates(), q.coordinates()) <= eps).count()
        };
        for cluster in &result.clusters {
            // At least one core point per cluster, and every member lies within eps of a core member
            let cores: Vec<&Point> = cluster.points.iter().filter(|p| neighbors(p) >= min_pts).collect();
            prop_assert!(!cores.is_empty());
            for member in &cluster.points {
                prop_assert!(cores.iter().any(|c| euclidean_distance(c.coordinates(), member.coordinates()) <= eps));
            }
        }
        for point in &result.noise {
            prop_assert!(neighbors(point) < min_pts);
        }
    }
}
