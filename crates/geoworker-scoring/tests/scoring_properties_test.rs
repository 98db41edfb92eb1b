//! Property tests for site scoring and ranking

use geoworker_core::models::{Criterion, Site, SiteAttributes, SiteCriteria};
use geoworker_scoring::{rank_sites, score};
use proptest::prelude::*;

fn attribute(range: std::ops::Range<f64>) -> impl Strategy<Value = Option<f64>> {
    prop::option::of(range)
}

fn attributes() -> impl Strategy<Value = SiteAttributes> {
    (
        (attribute(-10.0..500.0), attribute(-1.0..50.0), attribute(-1.0..50.0), attribute(-1.0..50.0)),
        (attribute(-1.0..20.0), attribute(-2.0..2.0), attribute(-2.0..2.0), attribute(-2.0..2.0)),
        (attribute(-2.0..2.0), attribute(0.0..50_000.0), attribute(0.0..200_000.0)),
        (attribute(0.0..30_000.0), attribute(0.0..100_000.0), attribute(-5.0..500.0), any::<bool>()),
    )
        .prop_map(|(a, b, c, d)| SiteAttributes {
            area: a.0,
            distance_to_road: a.1,
            distance_to_grid: a.2,
            distance_to_gas: a.3,
            distance_to_settlement: b.0,
            soil_quality: b.1,
            water_availability: b.2,
            biodiversity: b.3,
            flood_risk: c.0,
            land_cost: c.1,
            development_cost: c.2,
            operational_cost: d.0,
            expected_revenue: d.1,
            local_jobs: d.2,
            community_fund: d.3,
            ..Default::default()
        })
}

fn criteria() -> impl Strategy<Value = SiteCriteria> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(|(a, b, c, d)| SiteCriteria {
        environmental: Criterion { weight: a },
        infrastructure: Criterion { weight: b },
        economic: Criterion { weight: c },
        social: Criterion { weight: d },
    })
}

proptest! {
    #[test]
    fn subscores_stay_in_unit_interval(attrs in attributes(), criteria in criteria()) {
        let result = score(&Site::new("s", attrs), &criteria);
        for subscore in [result.environmental, result.infrastructure, result.economic, result.social] {
            prop_assert!((0.0..=1.0).contains(&subscore), "subscore {} out of range", subscore);
        }
    }

    #[test]
    fn scoring_is_bit_identical(attrs in attributes(), criteria in criteria()) {
        let site = Site::new("s", attrs);
        let first = score(&site, &criteria);
        let second = score(&site, &criteria);
        prop_assert_eq!(first.total_score.to_bits(), second.total_score.to_bits());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ranking_sorted_with_increasing_ranks(
        batch in prop::collection::vec(attributes(), 0..20),
        criteria in criteria(),
    ) {
        let sites: Vec<Site> =
            batch.into_iter().enumerate().map(|(i, a)| Site::new(format!("s{}", i), a)).collect();
        let ranked = rank_sites(&sites, &criteria);

        prop_assert_eq!(ranked.len(), sites.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].total_score >= pair[1].total_score);
            prop_assert!(pair[0].rank < pair[1].rank);
        }
        for (i, result) in ranked.iter().enumerate() {
            prop_assert_eq!(result.rank, Some(i + 1));
        }
    }
}
