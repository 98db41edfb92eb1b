//! Spatial measurement primitives.
//!
//! Distances use `geo`'s haversine measure on a sphere of radius
//! [`EARTH_RADIUS_M`]. Areas use `geo`'s planar area scaled by a fixed
//! meters-per-degree factor, which is only a rough approximation away from
//! the equator and over small extents.
//! `buffer` and `intersection` are placeholders: they return boxes, not
//! constructive geometry.

use crate::models::{from_geo_rect, to_line_string, Coordinate, DistanceUnit, Geometry, GeometryExt};
use geo::{Area, Distance, Euclidean, HaversineMeasure};
use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::models::SpatialRequest;
use serde::Serialize;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree used by the planar area approximation
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Half edge length, in degrees, of the placeholder buffer box
pub const BUFFER_HALF_SIZE_DEG: f64 = 0.01;

/// Great-circle distance in meters between two (lon, lat) coordinates
pub fn haversine_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    // geo's `Haversine` constant uses the GRS80 mean radius (6,371,008.8 m)
    HaversineMeasure::new(EARTH_RADIUS_M).distance(geo::Point::from(p1), geo::Point::from(p2))
}

/// Planar distance in coordinate units
pub fn euclidean_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    Euclidean.distance(geo::Point::from(p1), geo::Point::from(p2))
}

/// Approximate area in square meters of a coordinate ring.
///
/// The ring may be open or closed. Rings with fewer than three vertices
/// have zero area.
pub fn polygon_area(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    // Polygon::new closes an open ring
    let polygon = geo::Polygon::new(to_line_string(ring), vec![]);
    polygon.unsigned_area() * METERS_PER_DEGREE * METERS_PER_DEGREE
}

/// Representative point of a geometry.
///
/// Points return themselves, line strings their middle vertex, polygons the
/// arithmetic mean of the exterior ring vertices (closing vertex excluded),
/// and multipoints the mean of their members.
pub fn centroid(geometry: &Geometry) -> Option<Coordinate> {
    match geometry {
        Geometry::Point { coordinates } => Some(*coordinates),
        Geometry::LineString { coordinates } => coordinates.get(coordinates.len() / 2).copied(),
        Geometry::Polygon { coordinates } => {
            let ring = coordinates.first()?;
            let open = match (ring.first(), ring.last()) {
                (Some(first), Some(last)) if ring.len() > 1 && first == last => {
                    &ring[..ring.len() - 1]
                }
                _ => ring.as_slice(),
            };
            mean_coordinate(open)
        }
        Geometry::MultiPoint { coordinates } => mean_coordinate(coordinates),
    }
}

/// Arithmetic mean of a set of coordinates
pub fn mean_coordinate(coords: &[Coordinate]) -> Option<Coordinate> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (sx, sy) = coords.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
    Some([sx / n, sy / n])
}

/// Placeholder buffer: a fixed-size box around the geometry's centroid.
///
/// The requested buffer distance is not honoured.
pub fn buffer(geometry: &Geometry) -> Option<Geometry> {
    let [x, y] = centroid(geometry)?;
    Some(Geometry::rectangle(
        [x - BUFFER_HALF_SIZE_DEG, y - BUFFER_HALF_SIZE_DEG],
        [x + BUFFER_HALF_SIZE_DEG, y + BUFFER_HALF_SIZE_DEG],
    ))
}

/// Placeholder intersection: the overlap of the two bounding boxes.
///
/// Returns `None` when the boxes are disjoint or either geometry is empty.
pub fn intersection(a: &Geometry, b: &Geometry) -> Option<Geometry> {
    let box_a = a.bounding_box()?;
    let box_b = b.bounding_box()?;

    let min_x = box_a.min().x.max(box_b.min().x);
    let min_y = box_a.min().y.max(box_b.min().y);
    let max_x = box_a.max().x.min(box_b.max().x);
    let max_y = box_a.max().y.min(box_b.max().y);

    if min_x > max_x || min_y > max_y {
        return None;
    }

    let overlap = geo::Rect::new(geo::Coord { x: min_x, y: min_y }, geo::Coord { x: max_x, y: max_y });
    Some(from_geo_rect(&overlap))
}

/// Outcome of a `SPATIAL_ANALYSIS` task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialResult {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SpatialResult {
    fn geometry(operation: &str, geometry: Option<Geometry>) -> Self {
        Self { operation: operation.to_string(), geometry, value: None, unit: None }
    }

    fn measure(operation: &str, value: f64, unit: &str) -> Self {
        Self {
            operation: operation.to_string(),
            geometry: None,
            value: Some(value),
            unit: Some(unit.to_string()),
        }
    }
}

/// Run one spatial operation
pub fn analyze(request: &SpatialRequest) -> Result<SpatialResult> {
    let operation = request.operation_name();
    let result = match request {
        SpatialRequest::Buffer { geometry } => SpatialResult::geometry(operation, buffer(geometry)),
        SpatialRequest::Intersection { a, b } => {
            SpatialResult::geometry(operation, intersection(a, b))
        }
        SpatialRequest::Distance { from, to, unit } => {
            let meters = haversine_distance(*from, *to);
            SpatialResult::measure(operation, unit.from_meters(meters), unit_name(*unit))
        }
        SpatialRequest::Area { geometry } => {
            let ring = geometry.exterior_ring().ok_or_else(|| {
                GeoworkerError::invalid_options("area", "geometry must be a Polygon")
            })?;
            SpatialResult::measure(operation, polygon_area(ring), "square_meters")
        }
        SpatialRequest::Centroid { geometry } => {
            let point = centroid(geometry).ok_or_else(|| {
                GeoworkerError::invalid_options("centroid", "geometry has no vertices")
            })?;
            SpatialResult::geometry(operation, Some(Geometry::Point { coordinates: point }))
        }
    };
    Ok(result)
}

fn unit_name(unit: DistanceUnit) -> &'static str {
    match unit {
        DistanceUnit::Meters => "meters",
        DistanceUnit::Kilometers => "kilometers",
        DistanceUnit::Miles => "miles",
        DistanceUnit::Feet => "feet",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let distance = haversine_distance([0.0, 0.0], [0.0, 1.0]);
        assert!(
            (distance - 111_195.0).abs() < 1_112.0,
            "One degree of latitude {} should be ~111,195m",
            distance
        );
    }

    #[test]
    fn test_haversine_accuracy() {
        // Paris (2.3522, 48.8566) to London (-0.1276, 51.5074) ≈ 344km
        let distance = haversine_distance([2.3522, 48.8566], [-0.1276, 51.5074]);

        assert!(
            distance > 339_000.0 && distance < 349_000.0,
            "Paris-London distance {} should be ~344km",
            distance
        );
    }

    #[test]
    fn test_haversine_same_point() {
        let distance = haversine_distance([115.0, -8.0], [115.0, -8.0]);
        assert!(distance < 0.001, "Distance from point to itself should be ~0, got {}", distance);
    }

    #[test]
    fn test_polygon_area_unit_square() {
        let ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let area = polygon_area(&ring);
        assert!((area - 111_000.0 * 111_000.0).abs() < 1.0);

        // Winding order does not change the magnitude
        let reversed: Vec<Coordinate> = ring.iter().rev().copied().collect();
        assert!((polygon_area(&reversed) - area).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_uses_configured_radius() {
        // Quarter of a great circle along the equator
        let distance = haversine_distance([0.0, 0.0], [90.0, 0.0]);
        let expected = EARTH_RADIUS_M * std::f64::consts::FRAC_PI_2;
        assert!((distance - expected).abs() < 1e-6, "{} != {}", distance, expected);
    }

    #[test]
    fn test_polygon_area_open_ring_and_triangle() {
        let open = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!((polygon_area(&open) - 111_000.0 * 111_000.0).abs() < 1.0);

        let triangle = vec![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        assert!((polygon_area(&triangle) - 2.0 * 111_000.0 * 111_000.0).abs() < 1.0);
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance([0.0, 0.0], [3.0, 4.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[[0.0, 0.0], [1.0, 1.0]]), 0.0);
        assert_eq!(polygon_area(&[]), 0.0);
    }

    #[test]
    fn test_centroid_variants() {
        let square = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ]]);
        assert_eq!(centroid(&square), Some([1.0, 1.0]));

        assert_eq!(centroid(&Geometry::point(3.0, 4.0)), Some([3.0, 4.0]));

        let line = Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0], [5.0, 5.0]]);
        assert_eq!(centroid(&line), Some([1.0, 1.0]));

        assert_eq!(centroid(&Geometry::line_string(vec![])), None);
    }

    #[test]
    fn test_buffer_is_fixed_box() {
        let small = buffer(&Geometry::point(10.0, 10.0)).unwrap();
        let ring = small.exterior_ring().unwrap();
        assert!((ring[0][0] - 9.99).abs() < 1e-9);
        assert!((ring[2][1] - 10.01).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_of_boxes() {
        let a = Geometry::rectangle([0.0, 0.0], [10.0, 10.0]);
        let b = Geometry::rectangle([5.0, 5.0], [15.0, 15.0]);
        let overlap = intersection(&a, &b).unwrap();
        assert_eq!(overlap, Geometry::rectangle([5.0, 5.0], [10.0, 10.0]));

        let far = Geometry::rectangle([20.0, 20.0], [30.0, 30.0]);
        assert!(intersection(&a, &far).is_none());
    }

    #[test]
    fn test_analyze_distance_in_kilometers() {
        let request = SpatialRequest::Distance {
            from: [0.0, 0.0],
            to: [0.0, 1.0],
            unit: DistanceUnit::Kilometers,
        };
        let result = analyze(&request).unwrap();
        assert_eq!(result.operation, "distance");
        assert_eq!(result.unit.as_deref(), Some("kilometers"));
        assert!((result.value.unwrap() - 111.195).abs() < 1.0);
    }

    #[test]
    fn test_analyze_area_requires_polygon() {
        let request = SpatialRequest::Area { geometry: Geometry::point(0.0, 0.0) };
        assert!(matches!(analyze(&request), Err(GeoworkerError::InvalidOptions { .. })));
    }
}
