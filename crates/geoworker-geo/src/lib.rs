//! geoworker Geo - Spatial primitives
//!
//! Haversine distance, planar polygon area, vertex centroids, and the
//! placeholder buffer/intersection operations used by every algorithm crate.

pub mod models;
pub mod spatial;

pub use models::{from_geo_rect, to_geo_geometry, GeometryExt};
pub use spatial::{
    analyze, buffer, centroid, euclidean_distance, haversine_distance, intersection,
    polygon_area, SpatialResult, EARTH_RADIUS_M,
};
