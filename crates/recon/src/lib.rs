//! `pricewatch-recon`: competitor listing reconciliation and pricing rules.
//!
//! Pure engine crate: receives pre-loaded catalog and listings, returns
//! matches, per-SKU comparison rows and price recommendations.
//! No CLI, network or file IO.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod recommend;
pub mod similarity;
pub mod summary;
pub mod table;
pub mod text;

pub use config::{MatchConfig, PricingConfig, ReconConfig};
pub use engine::run;
pub use error::ReconError;
pub use model::{
    CatalogItem, ComparisonRow, MatchResult, PriceAction, PricePosition, Recommendation,
    ReconInput, RunResult, ScrapedListing,
};
pub use text::{normalize_name, parse_price};
