//! Fixed-size grid bucketing.

use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::models::{GridOptions, Point};
use std::collections::HashMap;
use std::time::Instant;

use crate::result::{Cluster, ClusteringResult};

/// Cell index along longitude and latitude
type CellKey = (i64, i64);

/// Group points by the grid cell containing them.
///
/// Clusters appear in the order their cell was first seen in the input, so
/// identical input and `cell_size` always produce identical output.
pub fn grid(points: &[Point], options: &GridOptions) -> Result<ClusteringResult> {
    let started = Instant::now();
    let cell_size = options.cell_size;

    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(GeoworkerError::invalid_options("grid", "cellSize must be a positive number"));
    }

    let mut index: HashMap<CellKey, usize> = HashMap::new();
    let mut cells: Vec<(CellKey, Vec<Point>)> = Vec::new();

    for point in points {
        let key = cell_key(point, cell_size)?;
        match index.get(&key) {
            Some(&slot) => cells[slot].1.push(point.clone()),
            None => {
                index.insert(key, cells.len());
                cells.push((key, vec![point.clone()]));
            }
        }
    }

    tracing::debug!(cell_size, points = points.len(), cells = cells.len(), "grid clustering finished");

    let clusters = cells
        .into_iter()
        .map(|((x, y), members)| Cluster::from_members(format!("cell_{}_{}", x, y), members))
        .collect();

    Ok(ClusteringResult::assemble("grid", points.len(), clusters, started))
}

fn cell_key(point: &Point, cell_size: f64) -> Result<CellKey> {
    Ok((cell_index(point.lon(), cell_size)?, cell_index(point.lat(), cell_size)?))
}

/// Floor of `coordinate / cell_size`, rejected when it does not fit an `i64`
fn cell_index(coordinate: f64, cell_size: f64) -> Result<i64> {
    let index = (coordinate / cell_size).floor();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if index.is_finite() && index >= i64::MIN as f64 && index < i64::MAX as f64 {
        Ok(index as i64)
    } else {
        Err(GeoworkerError::invalid_options(
            "grid",
            format!("cellSize {} is too small for coordinate {}", cell_size, coordinate),
        ))
    }
}
