//! Competitor page scraping.
//!
//! Turns a `sites.toml` description of competitor listing pages into
//! `ScrapedListing` rows. Fetching sits behind the `PageFetcher` trait
//! (plain HTTP or headless Chrome) so extraction and crawl logic run without
//! a network.

mod browser;
mod client;
pub mod config;
mod error;
pub mod extract;

pub use browser::{BrowserFetcher, RenderedPages};
pub use client::{scrape_site, HttpFetcher, PageFetcher, ScrapeReport};
pub use config::{HttpConfig, Selectors, SiteConfig, SiteKind, SitesConfig};
pub use error::ScrapeError;
pub use extract::{PageExtract, SiteExtractor, SkipReason};
