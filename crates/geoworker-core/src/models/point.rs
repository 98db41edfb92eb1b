use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::Coordinate;

/// A located input point for clustering and distance tasks.
///
/// Fields are private so a point cannot be altered after construction;
/// algorithms clone points into clusters rather than mutating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: String,
    coordinates: Coordinate,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
}

impl Point {
    /// Create a point from an identifier and (longitude, latitude)
    pub fn new(id: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self { id: id.into(), coordinates: [lon, lat], attributes: Map::new() }
    }

    /// Create a point carrying an attribute map
    pub fn with_attributes(
        id: impl Into<String>,
        coordinates: Coordinate,
        attributes: Map<String, Value>,
    ) -> Self {
        Self { id: id.into(), coordinates, attributes }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coordinates(&self) -> Coordinate {
        self.coordinates
    }

    pub fn lon(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}
