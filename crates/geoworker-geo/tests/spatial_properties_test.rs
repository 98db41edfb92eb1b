//! Property tests for the spatial primitives

use geoworker_geo::{centroid, haversine_distance, polygon_area};
use geoworker_core::models::Geometry;
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = [f64; 2]> {
    (-180.0f64..180.0, -89.0f64..89.0).prop_map(|(lon, lat)| [lon, lat])
}

proptest! {
    #[test]
    fn haversine_is_symmetric_and_bounded(a in coordinate(), b in coordinate()) {
        let ab = haversine_distance(a, b);
        let ba = haversine_distance(b, a);
        prop_assert!((ab - ba).abs() < 1e-6);
        prop_assert!(ab >= 0.0);
        // Never more than half the circumference
        prop_assert!(ab <= std::f64::consts::PI * 6_371_000.0 + 1.0);
    }

    #[test]
    fn rectangle_area_matches_scale(w in 0.001f64..5.0, h in 0.001f64..5.0) {
        let rect = Geometry::rectangle([0.0, 0.0], [w, h]);
        let area = polygon_area(rect.exterior_ring().unwrap());
        let expected = w * h * 111_000.0 * 111_000.0;
        prop_assert!((area - expected).abs() <= expected * 1e-9);
    }

    #[test]
    fn rectangle_centroid_is_center(x in -100.0f64..100.0, y in -80.0f64..80.0, w in 0.01f64..5.0) {
        let rect = Geometry::rectangle([x, y], [x + w, y + w]);
        let [cx, cy] = centroid(&rect).unwrap();
        prop_assert!((cx - (x + w / 2.0)).abs() < 1e-9);
        prop_assert!((cy - (y + w / 2.0)).abs() < 1e-9);
    }
}
