use std::collections::BTreeMap;

use crate::model::{ComparisonRow, MatchResult, PricePosition, Recommendation, RunSummary};

/// Compute summary statistics for a finished run.
pub fn compute_summary(
    catalog_items: usize,
    listings: usize,
    matches: &[MatchResult],
    comparison: &[ComparisonRow],
    recommendations: &[Recommendation],
) -> RunSummary {
    let mut action_counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in recommendations {
        *action_counts.entry(r.action.to_string()).or_insert(0) += 1;
    }

    let cheapest = comparison
        .iter()
        .filter(|r| r.price_position == PricePosition::Cheapest)
        .count();

    RunSummary {
        catalog_items,
        listings,
        matched: matches.len(),
        unmatched: listings.saturating_sub(matches.len()),
        compared_skus: comparison.len(),
        cheapest,
        above_min: comparison.len() - cheapest,
        action_counts,
    }
}
