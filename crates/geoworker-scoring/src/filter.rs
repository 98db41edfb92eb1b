//! Range-predicate site filtering.

use geoworker_core::models::{Site, SiteFilters};
use serde::Serialize;

/// Sites that satisfied every bound, and the ids of those that did not
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub sites: Vec<Site>,
    pub rejected: Vec<String>,
}

impl FilterResult {
    pub fn passed_count(&self) -> usize {
        self.sites.len()
    }
}

/// Keep the sites that satisfy the conjunction of all supplied filters.
///
/// A site with no value for a filtered field fails that filter. Input order
/// is preserved; an empty filter set passes everything.
pub fn filter_sites(sites: &[Site], filters: &SiteFilters) -> FilterResult {
    let (passed, failed): (Vec<&Site>, Vec<&Site>) = sites.iter().partition(|site| {
        filters.iter().all(|(field, range)| {
            field.value(&site.attributes).is_some_and(|value| range.contains(value))
        })
    });

    tracing::debug!(filters = filters.len(), passed = passed.len(), rejected = failed.len(), "filtered sites");

    FilterResult {
        sites: passed.into_iter().cloned().collect(),
        rejected: failed.into_iter().map(|site| site.id.clone()).collect(),
    }
}
