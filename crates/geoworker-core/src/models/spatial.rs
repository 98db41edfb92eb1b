//! Spatial analysis request models.

use serde::{Deserialize, Serialize};

use super::geometry::{Coordinate, DistanceUnit, Geometry};

/// Payload of `SPATIAL_ANALYSIS`, keyed by the options `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpatialRequest {
    /// Placeholder buffer: fixed-size box around the geometry's centroid
    Buffer { geometry: Geometry },
    /// Placeholder intersection: overlap of the two bounding boxes
    Intersection { a: Geometry, b: Geometry },
    Distance {
        from: Coordinate,
        to: Coordinate,
        #[serde(default)]
        unit: DistanceUnit,
    },
    Area { geometry: Geometry },
    Centroid { geometry: Geometry },
}

impl SpatialRequest {
    pub fn operation_name(&self) -> &'static str {
        match self {
            SpatialRequest::Buffer { .. } => "buffer",
            SpatialRequest::Intersection { .. } => "intersection",
            SpatialRequest::Distance { .. } => "distance",
            SpatialRequest::Area { .. } => "area",
            SpatialRequest::Centroid { .. } => "centroid",
        }
    }
}
