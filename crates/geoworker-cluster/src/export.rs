//! GeoJSON export of clustering results for map renderers.

use geojson::{Feature, FeatureCollection, JsonObject};
use geoworker_core::models::{Coordinate, Point};
use serde_json::Value;

use crate::result::ClusteringResult;

/// Render a result as a FeatureCollection.
///
/// Every member point becomes a Point feature carrying its attributes plus
/// a `cluster` property; noise points get `cluster: null`. Each cluster also
/// contributes one centroid feature with `role: "centroid"` and its size.
pub fn to_feature_collection(result: &ClusteringResult) -> FeatureCollection {
    let mut features = Vec::with_capacity(result.assigned_count() + result.clusters.len());

    for cluster in &result.clusters {
        for point in &cluster.points {
            features.push(member_feature(point, Value::String(cluster.label.clone())));
        }
    }
    for point in &result.noise {
        features.push(member_feature(point, Value::Null));
    }
    for cluster in &result.clusters {
        let mut properties = JsonObject::new();
        properties.insert("cluster".to_string(), Value::String(cluster.label.clone()));
        properties.insert("role".to_string(), Value::String("centroid".to_string()));
        properties.insert("size".to_string(), Value::from(cluster.len()));
        features.push(point_feature(cluster.centroid, None, properties));
    }

    FeatureCollection { bbox: None, features, foreign_members: None }
}

fn member_feature(point: &Point, cluster: Value) -> Feature {
    let mut properties = point.attributes().clone();
    properties.insert("cluster".to_string(), cluster);
    properties.insert("role".to_string(), Value::String("member".to_string()));
    point_feature(point.coordinates(), Some(point.id()), properties)
}

fn point_feature(coordinates: Coordinate, id: Option<&str>, properties: JsonObject) -> Feature {
    let geometry = geojson::Geometry::new(geojson::Value::Point(coordinates.to_vec()));
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: id.map(|id| geojson::feature::Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}
