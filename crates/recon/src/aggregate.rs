use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{CatalogItem, ComparisonRow, MatchResult, PricePosition};

/// How many competitor names are kept as examples per SKU.
pub const EXAMPLE_PRODUCTS: usize = 3;

#[derive(Default)]
struct PriceGroup<'a> {
    min: f64,
    max: f64,
    sum: f64,
    count: usize,
    sites: BTreeSet<&'a str>,
    examples: Vec<String>,
}

/// Group matches by SKU and join the statistics with the catalog.
///
/// Only SKUs that have at least one match and exist in the catalog produce a
/// row. Rows come out in ascending SKU order.
pub fn aggregate_matches(matches: &[MatchResult], catalog: &[CatalogItem]) -> Vec<ComparisonRow> {
    let mut groups: BTreeMap<&str, PriceGroup> = BTreeMap::new();

    for m in matches {
        let entry = groups.entry(m.sku.as_str()).or_insert_with(|| PriceGroup {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            ..PriceGroup::default()
        });
        entry.min = entry.min.min(m.comp_price);
        entry.max = entry.max.max(m.comp_price);
        entry.sum += m.comp_price;
        entry.count += 1;
        entry.sites.insert(m.source_site.as_str());
        if entry.examples.len() < EXAMPLE_PRODUCTS {
            entry.examples.push(m.comp_name.clone());
        }
    }

    let by_sku: HashMap<&str, &CatalogItem> =
        catalog.iter().map(|item| (item.sku.as_str(), item)).collect();

    let mut rows = Vec::with_capacity(groups.len());
    for (sku, group) in groups {
        let Some(item) = by_sku.get(sku) else {
            log::debug!("sku '{sku}' has matches but is not in the catalog; skipped");
            continue;
        };

        let price_position = if item.current_price <= group.min {
            PricePosition::Cheapest
        } else {
            PricePosition::AboveMin
        };

        rows.push(ComparisonRow {
            sku: item.sku.clone(),
            name: item.name.clone(),
            brand: item.brand.clone(),
            category: item.category.clone(),
            cost: item.cost,
            current_price: item.current_price,
            min_comp_price: group.min,
            max_comp_price: group.max,
            avg_comp_price: group.sum / group.count as f64,
            price_difference: item.current_price - group.min,
            price_position,
            competitors: group.sites.len(),
            comp_products: group.examples,
        });
    }

    rows
}
