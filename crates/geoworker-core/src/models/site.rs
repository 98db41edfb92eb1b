//! Candidate site models for scoring and filtering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::geometry::{Coordinate, DistanceUnit};
use super::point::Point;

/// A candidate site under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(flatten)]
    pub attributes: SiteAttributes,
}

impl Site {
    pub fn new(id: impl Into<String>, attributes: SiteAttributes) -> Self {
        Self { id: id.into(), name: None, location: None, attributes }
    }
}

/// Measured site attributes. Any attribute may be unknown.
///
/// Units: area in hectares, distances in kilometers, slope in degrees,
/// elevation in meters, costs and revenue per hectare. Quality and risk
/// indicators are fractions in `0.0..=1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAttributes {
    pub area: Option<f64>,
    pub distance_to_road: Option<f64>,
    pub distance_to_grid: Option<f64>,
    pub distance_to_gas: Option<f64>,
    pub distance_to_settlement: Option<f64>,
    pub slope: Option<f64>,
    pub elevation: Option<f64>,
    pub soil_quality: Option<f64>,
    pub water_availability: Option<f64>,
    pub biodiversity: Option<f64>,
    pub flood_risk: Option<f64>,
    pub land_cost: Option<f64>,
    pub development_cost: Option<f64>,
    pub operational_cost: Option<f64>,
    pub expected_revenue: Option<f64>,
    pub local_jobs: Option<f64>,
    #[serde(default)]
    pub community_fund: bool,
}

/// Weight given to one scoring dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub weight: f64,
}

impl Default for Criterion {
    fn default() -> Self {
        Self { weight: 0.25 }
    }
}

/// Weights for the four scoring dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteCriteria {
    pub environmental: Criterion,
    pub infrastructure: Criterion,
    pub economic: Criterion,
    pub social: Criterion,
}

/// Scoring outcome for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub site_id: String,
    pub environmental: f64,
    pub infrastructure: f64,
    pub economic: f64,
    pub social: f64,
    pub total_score: f64,
    /// 1-based position after a batch has been sorted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

/// Attributes that range filters can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiteField {
    Area,
    DistanceToRoad,
    DistanceToGrid,
    DistanceToGas,
    Slope,
    SoilQuality,
    FloodRisk,
    WaterAvailability,
    Elevation,
}

impl SiteField {
    pub const ALL: [SiteField; 9] = [
        SiteField::Area,
        SiteField::DistanceToRoad,
        SiteField::DistanceToGrid,
        SiteField::DistanceToGas,
        SiteField::Slope,
        SiteField::SoilQuality,
        SiteField::FloodRisk,
        SiteField::WaterAvailability,
        SiteField::Elevation,
    ];

    /// Read this field from a site's attributes
    pub fn value(&self, attributes: &SiteAttributes) -> Option<f64> {
        match self {
            SiteField::Area => attributes.area,
            SiteField::DistanceToRoad => attributes.distance_to_road,
            SiteField::DistanceToGrid => attributes.distance_to_grid,
            SiteField::DistanceToGas => attributes.distance_to_gas,
            SiteField::Slope => attributes.slope,
            SiteField::SoilQuality => attributes.soil_quality,
            SiteField::FloodRisk => attributes.flood_risk,
            SiteField::WaterAvailability => attributes.water_availability,
            SiteField::Elevation => attributes.elevation,
        }
    }
}

/// Numeric range predicate. Bounds are inclusive unless marked exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub exclusive_min: bool,
    #[serde(default)]
    pub exclusive_max: bool,
}

impl RangeFilter {
    pub fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max), ..Default::default() }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), ..Default::default() }
    }

    pub fn at_most(max: f64) -> Self {
        Self { max: Some(max), ..Default::default() }
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive_min = true;
        self.exclusive_max = true;
        self
    }

    /// Check a value against every supplied bound
    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Some(min) if self.exclusive_min => value > min,
            Some(min) => value >= min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if self.exclusive_max => value < max,
            Some(max) => value <= max,
            None => true,
        };
        above_min && below_max
    }
}

/// Conjunction of range predicates keyed by field
pub type SiteFilters = BTreeMap<SiteField, RangeFilter>;

/// Payload of `SCORE_SITES`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSitesRequest {
    pub sites: Vec<Site>,
    #[serde(default)]
    pub criteria: SiteCriteria,
}

/// Payload of `APPLY_FILTERS`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyFiltersRequest {
    pub sites: Vec<Site>,
    pub filters: SiteFilters,
}

/// Payload of `ANALYZE_SITES`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSitesRequest {
    pub sites: Vec<Site>,
    #[serde(default)]
    pub criteria: SiteCriteria,
    #[serde(default)]
    pub filters: SiteFilters,
}

/// Payload of `CALCULATE_DISTANCES`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateDistancesRequest {
    pub points: Vec<Point>,
    /// When set, distances are measured from this coordinate to every point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Coordinate>,
    #[serde(default)]
    pub unit: DistanceUnit,
}
