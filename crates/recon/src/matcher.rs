use rayon::prelude::*;

use crate::config::MatchConfig;
use crate::model::{CatalogItem, MatchResult, NormalizedListing, ScrapedListing};
use crate::similarity::weighted_ratio;
use crate::text::normalize_name;

/// Catalog entry prepared once per run.
struct CatalogKey<'a> {
    item: &'a CatalogItem,
    norm_name: String,
    brand: String,
}

/// Assign each listing to its best-scoring catalog SKU.
///
/// Every listing is scored against the whole catalog; the brand boost is added
/// when the catalog brand occurs in the listing's normalized name. Candidates
/// are visited in ascending SKU order and a later candidate must score strictly
/// higher to win, so ties resolve to the smallest SKU regardless of input
/// order. Listings whose best score is below the threshold are dropped.
/// Output order follows the input listings.
pub fn match_listings(
    listings: &[ScrapedListing],
    catalog: &[CatalogItem],
    config: &MatchConfig,
) -> Vec<MatchResult> {
    if listings.is_empty() || catalog.is_empty() {
        return Vec::new();
    }

    let mut keys: Vec<CatalogKey> = catalog
        .iter()
        .map(|item| CatalogKey {
            item,
            norm_name: normalize_name(&item.name),
            brand: item.brand.trim().to_lowercase(),
        })
        .collect();
    keys.sort_by(|a, b| a.item.sku.cmp(&b.item.sku));

    let normalized: Vec<NormalizedListing> = listings
        .iter()
        .map(|listing| NormalizedListing {
            listing,
            norm_name: normalize_name(&listing.name),
        })
        .collect();

    let matches: Vec<MatchResult> = normalized
        .par_iter()
        .filter_map(|nl| best_match(nl, &keys, config))
        .collect();

    log::debug!(
        "matched {} of {} listings against {} catalog items",
        matches.len(),
        listings.len(),
        catalog.len()
    );

    matches
}

fn best_match(
    listing: &NormalizedListing,
    keys: &[CatalogKey],
    config: &MatchConfig,
) -> Option<MatchResult> {
    let mut best: Option<(&CatalogItem, f64)> = None;

    for key in keys {
        let mut score = weighted_ratio(&listing.norm_name, &key.norm_name);
        if !key.brand.is_empty() && listing.norm_name.contains(&key.brand) {
            score += config.brand_boost;
        }
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((key.item, score));
        }
    }

    let (item, score) = best?;
    if score < config.match_threshold {
        return None;
    }

    let l = listing.listing;
    Some(MatchResult {
        source_site: l.site.clone(),
        comp_name: l.name.clone(),
        comp_price: l.price,
        comp_url: l.url.clone(),
        sku: item.sku.clone(),
        match_score: score,
    })
}
