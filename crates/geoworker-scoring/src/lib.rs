//! geoworker Scoring - Site evaluation and selection
//!
//! Weighted multi-criteria scoring of candidate sites, batch ranking,
//! range-predicate filtering and the combined filter-then-rank analysis,
//! plus haversine distance reports between located points.

pub mod analysis;
pub mod filter;
pub mod scoring;

pub use analysis::{
    analyze_sites, calculate_distances, AnalysisSummary, DistanceReport, PointDistance,
    SiteAnalysis,
};
pub use filter::{filter_sites, FilterResult};
pub use scoring::{
    economic_score, environmental_score, infrastructure_score, rank_sites, score, social_score,
};
