//! Canonical geometry types used across all geoworker crates.
//!
//! These types mirror GeoJSON geometry objects so task payloads can carry
//! them directly; `geoworker-geo` converts them to `geo` crate types.

use serde::{Deserialize, Serialize};

/// Coordinate pair in (longitude, latitude) order
pub type Coordinate = [f64; 2];

/// Distance units for spatial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    /// Convert a distance value from meters to this unit
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.34,
            DistanceUnit::Feet => meters / 0.3048,
        }
    }
}

/// GeoJSON-compatible geometry representation
///
/// Polygons are stored as a list of rings, the first being the exterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coordinate },
    LineString { coordinates: Vec<Coordinate> },
    Polygon { coordinates: Vec<Vec<Coordinate>> },
    MultiPoint { coordinates: Vec<Coordinate> },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<Coordinate>) -> Self {
        Geometry::LineString { coordinates: coords }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<Coordinate>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Create an axis-aligned rectangle polygon from its corners
    pub fn rectangle(min: Coordinate, max: Coordinate) -> Self {
        Geometry::Polygon {
            coordinates: vec![vec![
                [min[0], min[1]],
                [max[0], min[1]],
                [max[0], max[1]],
                [min[0], max[1]],
                [min[0], min[1]],
            ]],
        }
    }

    /// Exterior ring of a polygon, if this is one
    pub fn exterior_ring(&self) -> Option<&[Coordinate]> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(|r| r.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serialization() {
        let point = Geometry::point(115.0, -8.5);
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("Point"));
        assert!(json.contains("115"));

        let parsed: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(point, parsed);
    }

    #[test]
    fn test_rectangle_is_closed() {
        let rect = Geometry::rectangle([0.0, 0.0], [2.0, 1.0]);
        let ring = rect.exterior_ring().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_distance_unit_conversion() {
        assert!((DistanceUnit::Kilometers.from_meters(5000.0) - 5.0).abs() < 0.01);
        assert!((DistanceUnit::Miles.from_meters(1609.34) - 1.0).abs() < 0.01);
        let unit: DistanceUnit = serde_json::from_str("\"kilometers\"").unwrap();
        assert_eq!(unit, DistanceUnit::Kilometers);
    }
}
