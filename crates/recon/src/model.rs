use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One product from the internal catalog. Read-only for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub cost: f64,
    pub current_price: f64,
}

/// One product card found on a competitor page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedListing {
    pub site: String,
    pub name: String,
    pub price: f64,
    pub url: String,
}

/// A listing plus its canonical name. Lives only inside the matcher.
#[derive(Debug, Clone)]
pub struct NormalizedListing<'a> {
    pub listing: &'a ScrapedListing,
    pub norm_name: String,
}

/// Pre-loaded tables for a single run.
pub struct ReconInput {
    pub catalog: Vec<CatalogItem>,
    pub listings: Vec<ScrapedListing>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source_site: String,
    pub comp_name: String,
    pub comp_price: f64,
    pub comp_url: String,
    pub sku: String,
    pub match_score: f64,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    Cheapest,
    AboveMin,
}

impl PricePosition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cheapest" => Some(Self::Cheapest),
            "above_min" => Some(Self::AboveMin),
            _ => None,
        }
    }
}

impl std::fmt::Display for PricePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cheapest => write!(f, "cheapest"),
            Self::AboveMin => write!(f, "above_min"),
        }
    }
}

/// Competitive price statistics for one SKU, joined with its catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub cost: f64,
    pub current_price: f64,
    pub min_comp_price: f64,
    pub max_comp_price: f64,
    pub avg_comp_price: f64,
    pub price_difference: f64,
    pub price_position: PricePosition,
    pub competitors: usize,
    pub comp_products: Vec<String>,
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAction {
    Decrease,
    Increase,
    Keep,
}

impl std::fmt::Display for PriceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decrease => write!(f, "decrease"),
            Self::Increase => write!(f, "increase"),
            Self::Keep => write!(f, "keep"),
        }
    }
}

/// Row fed to the recommendation rules: a comparison row or a catalog-only row.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRow {
    pub sku: String,
    pub name: String,
    pub cost: f64,
    pub current_price: f64,
    pub min_comp_price: Option<f64>,
}

impl From<&ComparisonRow> for PricingRow {
    fn from(row: &ComparisonRow) -> Self {
        Self {
            sku: row.sku.clone(),
            name: row.name.clone(),
            cost: row.cost,
            current_price: row.current_price,
            min_comp_price: Some(row.min_comp_price),
        }
    }
}

impl From<&CatalogItem> for PricingRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            sku: item.sku.clone(),
            name: item.name.clone(),
            cost: item.cost,
            current_price: item.current_price,
            min_comp_price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub sku: String,
    pub name: String,
    pub current_price: f64,
    pub min_comp_price: Option<f64>,
    pub recommended_price: f64,
    pub action: PriceAction,
    pub reason: String,
    pub min_allowed_price: f64,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub catalog_items: usize,
    pub listings: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub compared_skus: usize,
    pub cheapest: usize,
    pub above_min: usize,
    pub action_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub match_threshold: f64,
    pub brand_boost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub matches: Vec<MatchResult>,
    pub comparison: Vec<ComparisonRow>,
    pub recommendations: Vec<Recommendation>,
}
