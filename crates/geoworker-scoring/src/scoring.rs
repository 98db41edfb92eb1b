//! Multi-criteria site scoring.
//!
//! Each dimension combines bracketed or linear contributions into a subscore
//! in `0.0..=1.0`. Unknown or non-finite attributes contribute a neutral
//! value so a sparsely surveyed site is neither rewarded nor punished.
//! The total is the criteria-weighted sum of the four subscores.

use geoworker_core::models::{ScoreResult, Site, SiteAttributes, SiteCriteria};

/// Contribution used when an attribute is unknown
const NEUTRAL: f64 = 0.5;

/// Score a single site. Pure: identical input yields bit-identical output.
pub fn score(site: &Site, criteria: &SiteCriteria) -> ScoreResult {
    let attrs = &site.attributes;
    let environmental = environmental_score(attrs);
    let infrastructure = infrastructure_score(attrs);
    let economic = economic_score(attrs);
    let social = social_score(attrs);

    let total_score = environmental * criteria.environmental.weight
        + infrastructure * criteria.infrastructure.weight
        + economic * criteria.economic.weight
        + social * criteria.social.weight;

    ScoreResult {
        site_id: site.id.clone(),
        environmental,
        infrastructure,
        economic,
        social,
        total_score,
        rank: None,
    }
}

/// Score every site, sort by descending total and assign 1-based ranks.
///
/// The sort is stable, so equal totals keep their input order.
pub fn rank_sites(sites: &[Site], criteria: &SiteCriteria) -> Vec<ScoreResult> {
    let mut results: Vec<ScoreResult> = sites.iter().map(|site| score(site, criteria)).collect();
    results.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

    for (position, result) in results.iter_mut().enumerate() {
        result.rank = Some(position + 1);
    }

    tracing::debug!(sites = results.len(), "ranked sites");
    results
}

/// Soil, water and biodiversity reward; flood risk penalises
pub fn environmental_score(attrs: &SiteAttributes) -> f64 {
    let soil = fraction(attrs.soil_quality);
    let water = fraction(attrs.water_availability);
    let biodiversity = fraction(attrs.biodiversity);
    let flood_safety = known(attrs.flood_risk).map_or(NEUTRAL, |risk| 1.0 - clamp01(risk));

    clamp01(0.3 * soil + 0.3 * water + 0.2 * biodiversity + 0.2 * flood_safety)
}

/// Proximity to road, grid and gas networks plus water supply
pub fn infrastructure_score(attrs: &SiteAttributes) -> f64 {
    let road = bracket(attrs.distance_to_road, &[(1.0, 1.0), (5.0, 0.7), (10.0, 0.4)], 0.1);
    let grid = bracket(attrs.distance_to_grid, &[(2.0, 1.0), (10.0, 0.6), (25.0, 0.3)], 0.0);
    let gas = bracket(attrs.distance_to_gas, &[(5.0, 1.0), (20.0, 0.5)], 0.1);
    let water = fraction(attrs.water_availability);

    clamp01(0.35 * road + 0.35 * grid + 0.15 * gas + 0.15 * water)
}

/// Land and development cost, with running-cost penalties and revenue bonuses
pub fn economic_score(attrs: &SiteAttributes) -> f64 {
    let land = known(attrs.land_cost).map_or(NEUTRAL, |cost| falling(cost, 1_000.0, 20_000.0));
    let development =
        known(attrs.development_cost).map_or(NEUTRAL, |cost| falling(cost, 5_000.0, 100_000.0));

    let penalty = match known(attrs.operational_cost) {
        Some(cost) if cost > 10_000.0 => 0.2,
        Some(cost) if cost > 5_000.0 => 0.1,
        _ => 0.0,
    };
    let bonus = match known(attrs.expected_revenue) {
        Some(revenue) if revenue >= 50_000.0 => 0.2,
        Some(revenue) if revenue >= 20_000.0 => 0.1,
        _ => 0.0,
    };

    clamp01(0.5 * land + 0.5 * development - penalty + bonus)
}

/// Community acceptance, usable area and local benefits
pub fn social_score(attrs: &SiteAttributes) -> f64 {
    // Farther from settlements means fewer objections
    let acceptance = known(attrs.distance_to_settlement).map_or(NEUTRAL, |distance| {
        if distance >= 5.0 {
            1.0
        } else if distance >= 2.0 {
            0.7
        } else if distance >= 1.0 {
            0.4
        } else {
            0.1
        }
    });

    let area = known(attrs.area).map_or(NEUTRAL, |hectares| {
        if hectares >= 50.0 {
            1.0
        } else if hectares >= 10.0 {
            0.7
        } else if hectares >= 1.0 {
            0.4
        } else {
            0.2
        }
    });

    let jobs = known(attrs.local_jobs).map_or(0.0, |jobs| clamp01(jobs / 50.0) * 0.7);
    let fund = if attrs.community_fund { 0.3 } else { 0.0 };
    let benefits = clamp01(jobs + fund);

    clamp01(0.5 * acceptance + 0.3 * area + 0.2 * benefits)
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn fraction(value: Option<f64>) -> f64 {
    known(value).map_or(NEUTRAL, clamp01)
}

/// First bracket whose upper bound covers the distance, else `beyond`
fn bracket(distance: Option<f64>, brackets: &[(f64, f64)], beyond: f64) -> f64 {
    let Some(distance) = known(distance) else {
        return NEUTRAL;
    };
    brackets
        .iter()
        .find(|(limit, _)| distance <= *limit)
        .map_or(beyond, |(_, score)| *score)
}

/// 1.0 at or below `best`, 0.0 at or above `worst`, linear between
fn falling(value: f64, best: f64, worst: f64) -> f64 {
    clamp01((worst - value) / (worst - best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoworker_core::models::Criterion;

    fn ideal() -> SiteAttributes {
        SiteAttributes {
            area: Some(80.0),
            distance_to_road: Some(0.5),
            distance_to_grid: Some(1.0),
            distance_to_gas: Some(2.0),
            distance_to_settlement: Some(8.0),
            soil_quality: Some(1.0),
            water_availability: Some(1.0),
            biodiversity: Some(1.0),
            flood_risk: Some(0.0),
            land_cost: Some(500.0),
            development_cost: Some(1_000.0),
            operational_cost: Some(1_000.0),
            expected_revenue: Some(60_000.0),
            local_jobs: Some(100.0),
            community_fund: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_ideal_site_scores_one_everywhere() {
        let result = score(&Site::new("best", ideal()), &SiteCriteria::default());
        for subscore in [result.environmental, result.infrastructure, result.economic, result.social] {
            assert!((subscore - 1.0).abs() < 1e-12, "expected a perfect subscore, got {}", subscore);
        }
        assert!((result.total_score - 1.0).abs() < 1e-12);
        assert_eq!(result.rank, None);
    }

    #[test]
    fn test_unknown_attributes_are_neutral() {
        let attrs = SiteAttributes::default();
        assert!((environmental_score(&attrs) - 0.5).abs() < 1e-12);
        assert!((infrastructure_score(&attrs) - 0.5).abs() < 1e-12);
        assert!((economic_score(&attrs) - 0.5).abs() < 1e-12);
        // acceptance and area neutral, no local benefits
        assert!((social_score(&attrs) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_treated_as_unknown() {
        let attrs = SiteAttributes { soil_quality: Some(f64::NAN), ..Default::default() };
        assert_eq!(environmental_score(&attrs), environmental_score(&SiteAttributes::default()));
    }

    #[test]
    fn test_infrastructure_brackets() {
        let attrs = SiteAttributes {
            distance_to_road: Some(7.0),
            distance_to_grid: Some(30.0),
            distance_to_gas: Some(10.0),
            water_availability: Some(0.0),
            ..Default::default()
        };
        let expected = 0.35 * 0.4 + 0.35 * 0.0 + 0.15 * 0.5 + 0.15 * 0.0;
        assert!((infrastructure_score(&attrs) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_economic_penalty_and_bonus() {
        let base = SiteAttributes {
            land_cost: Some(10_500.0),
            development_cost: Some(52_500.0),
            ..Default::default()
        };
        assert!((economic_score(&base) - 0.5).abs() < 1e-12);

        let costly = SiteAttributes { operational_cost: Some(20_000.0), ..base.clone() };
        assert!((economic_score(&costly) - 0.3).abs() < 1e-12);

        let lucrative = SiteAttributes { expected_revenue: Some(25_000.0), ..base };
        assert!((economic_score(&lucrative) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_weights_shape_total() {
        let criteria = SiteCriteria {
            environmental: Criterion { weight: 1.0 },
            infrastructure: Criterion { weight: 0.0 },
            economic: Criterion { weight: 0.0 },
            social: Criterion { weight: 0.0 },
        };
        let attrs = SiteAttributes { soil_quality: Some(0.0), ..Default::default() };
        let result = score(&Site::new("s", attrs.clone()), &criteria);
        assert_eq!(result.total_score, environmental_score(&attrs));
    }

    #[test]
    fn test_rank_is_stable_and_descending() {
        let weak = SiteAttributes { soil_quality: Some(0.0), ..Default::default() };
        let sites = vec![
            Site::new("tie-a", SiteAttributes::default()),
            Site::new("best", ideal()),
            Site::new("weak", weak),
            Site::new("tie-b", SiteAttributes::default()),
        ];
        let ranked = rank_sites(&sites, &SiteCriteria::default());

        let ids: Vec<&str> = ranked.iter().map(|r| r.site_id.as_str()).collect();
        assert_eq!(ids, vec!["best", "tie-a", "tie-b", "weak"]);
        let ranks: Vec<usize> = ranked.iter().filter_map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }
}
