pub mod cluster;
pub mod dataset;
pub mod geometry;
pub mod point;
pub mod site;
pub mod spatial;

pub use cluster::{
    ClusterOptions, ClusterRequest, DensityOptions, DistanceMetric, GridOptions,
    HierarchicalOptions, KMeansOptions, Linkage,
};
pub use dataset::{
    AggregateDataRequest, AggregateOp, Calculation, CleanDataRequest, CleaningRule, CleaningRules,
    DisplayFormat, FieldSchema, FieldType, FilterOperator, Record, Schema, TransformDataRequest,
    Transformation, ValidateDataRequest,
};
pub use geometry::{Coordinate, DistanceUnit, Geometry};
pub use point::Point;
pub use site::{
    AnalyzeSitesRequest, ApplyFiltersRequest, CalculateDistancesRequest, Criterion, RangeFilter,
    ScoreResult, ScoreSitesRequest, Site, SiteAttributes, SiteCriteria, SiteField, SiteFilters,
};
pub use spatial::SpatialRequest;
