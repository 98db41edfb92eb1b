//! Combined site analysis and distance reports.

use geoworker_core::models::{
    AnalyzeSitesRequest, CalculateDistancesRequest, Coordinate, DistanceUnit, ScoreResult,
};
use geoworker_geo::haversine_distance;
use serde::Serialize;

use crate::filter::filter_sites;
use crate::scoring::rank_sites;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub sites_analysed: usize,
    pub passed_filters: usize,
    /// Mean total score of the ranked sites, absent when none passed
    pub average_score: Option<f64>,
    pub best_site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    pub results: Vec<ScoreResult>,
    pub rejected: Vec<String>,
    pub summary: AnalysisSummary,
}

/// Filter the candidate sites, then score and rank the survivors
pub fn analyze_sites(request: &AnalyzeSitesRequest) -> SiteAnalysis {
    let filtered = filter_sites(&request.sites, &request.filters);
    let results = rank_sites(&filtered.sites, &request.criteria);

    let average_score = if results.is_empty() {
        None
    } else {
        Some(results.iter().map(|r| r.total_score).sum::<f64>() / results.len() as f64)
    };

    let summary = AnalysisSummary {
        sites_analysed: request.sites.len(),
        passed_filters: results.len(),
        average_score,
        best_site: results.first().map(|r| r.site_id.clone()),
    };

    SiteAnalysis { results, rejected: filtered.rejected, summary }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDistance {
    pub id: String,
    pub distance: f64,
}

/// Distances either from one origin or between every pair of points
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum DistanceReport {
    /// Nearest first
    FromOrigin { origin: Coordinate, unit: DistanceUnit, distances: Vec<PointDistance> },
    /// Symmetric, zero diagonal, rows and columns in `ids` order
    Matrix { unit: DistanceUnit, ids: Vec<String>, distances: Vec<Vec<f64>> },
}

/// Haversine distances in the requested unit
pub fn calculate_distances(request: &CalculateDistancesRequest) -> DistanceReport {
    let unit = request.unit;
    let points = &request.points;

    match request.origin {
        Some(origin) => {
            let mut distances: Vec<PointDistance> = points
                .iter()
                .map(|p| PointDistance {
                    id: p.id().to_string(),
                    distance: unit.from_meters(haversine_distance(origin, p.coordinates())),
                })
                .collect();
            distances.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            DistanceReport::FromOrigin { origin, unit, distances }
        }
        None => {
            let n = points.len();
            let mut distances = vec![vec![0.0; n]; n];
            for i in 0..n {
                for j in (i + 1)..n {
                    let meters = haversine_distance(points[i].coordinates(), points[j].coordinates());
                    let d = unit.from_meters(meters);
                    distances[i][j] = d;
                    distances[j][i] = d;
                }
            }
            let ids = points.iter().map(|p| p.id().to_string()).collect();
            DistanceReport::Matrix { unit, ids, distances }
        }
    }
}
