//! Geometry conversions for geoworker-geo.
//!
//! This module re-exports canonical types from `geoworker-core` and converts
//! them to and from the `geo` crate types.

use geo::Geometry as GeoGeometry;

// Re-export canonical types from geoworker-core
pub use geoworker_core::models::{Coordinate, DistanceUnit, Geometry};

pub(crate) fn to_line_string(coords: &[Coordinate]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => GeoGeometry::LineString(to_line_string(coordinates)),
        Geometry::Polygon { coordinates } => {
            let mut rings = coordinates.iter().map(|ring| to_line_string(ring));
            let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
            GeoGeometry::Polygon(geo::Polygon::new(exterior, rings.collect()))
        }
        Geometry::MultiPoint { coordinates } => {
            let points: Vec<geo::Point> =
                coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect();
            GeoGeometry::MultiPoint(geo::MultiPoint::new(points))
        }
    }
}

/// Convert a geo::Rect to a closed canonical Polygon
pub fn from_geo_rect(rect: &geo::Rect) -> Geometry {
    let min = rect.min();
    let max = rect.max();
    Geometry::rectangle([min.x, min.y], [max.x, max.y])
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Axis-aligned bounding box, `None` for empty geometries
    fn bounding_box(&self) -> Option<geo::Rect>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn bounding_box(&self) -> Option<geo::Rect> {
        use geo::BoundingRect;
        match self.to_geo() {
            GeoGeometry::Point(p) => Some(geo::Rect::new(p.0, p.0)),
            other => other.bounding_rect(),
        }
    }
}
