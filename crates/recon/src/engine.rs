use crate::aggregate::aggregate_matches;
use crate::config::ReconConfig;
use crate::matcher::match_listings;
use crate::model::{ReconInput, RunMeta, RunResult};
use crate::recommend::recommend;
use crate::summary::compute_summary;

/// Run the whole pipeline: match, compare, recommend.
///
/// Never fails on data problems; empty inputs give empty outputs.
pub fn run(config: &ReconConfig, input: &ReconInput) -> RunResult {
    let matches = match_listings(&input.listings, &input.catalog, &config.matching);
    let comparison = aggregate_matches(&matches, &input.catalog);
    let recommendations = recommend(&comparison, &input.catalog, &config.pricing);

    let summary = compute_summary(
        input.catalog.len(),
        input.listings.len(),
        &matches,
        &comparison,
        &recommendations,
    );

    log::info!(
        "pipeline: {} listings, {} matched, {} skus compared, {} recommendations",
        summary.listings,
        summary.matched,
        summary.compared_skus,
        recommendations.len()
    );

    RunResult {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            match_threshold: config.matching.match_threshold,
            brand_boost: config.matching.brand_boost,
        },
        summary,
        matches,
        comparison,
        recommendations,
    }
}
