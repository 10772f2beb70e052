use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ScrapeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SitesConfig {
    #[serde(default)]
    pub http: HttpConfig,
    pub sites: Vec<SiteConfig>,
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Request settings shared by every site. Passed explicitly to the fetcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Pause between two requests to the same site.
    pub delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("pricewatch/{}", env!("CARGO_PKG_VERSION")),
            accept_language: "en-US,en;q=0.9".into(),
            timeout_secs: 30,
            delay_ms: 1500,
        }
    }
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub kind: SiteKind,
    /// Base for resolving relative product links. Defaults to the page URL.
    #[serde(default)]
    pub base_url: Option<String>,
    pub list_urls: Vec<String>,
    pub selectors: Selectors,
    #[serde(default = "default_price_regex")]
    pub price_regex: String,
    /// Pages followed per list URL (`crawl` only).
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_next_selector")]
    pub next_selector: String,
    /// Element that must exist before a rendered page is read (`browser`
    /// only). Defaults to `selectors.item`.
    #[serde(default)]
    pub wait_for: Option<String>,
    /// Keep scrolling to the bottom until the page stops growing (`browser`
    /// only). For listings that load more cards on scroll.
    #[serde(default)]
    pub scroll: bool,
}

impl SiteConfig {
    /// Selector a rendered page waits for.
    pub fn wait_selector(&self) -> &str {
        self.wait_for.as_deref().unwrap_or(&self.selectors.item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Fetch each list URL once.
    Static,
    /// Fetch each list URL and follow its "next page" links.
    Crawl,
    /// Render each list URL in headless Chrome, then extract as `static`.
    Browser,
}

impl std::fmt::Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Crawl => write!(f, "crawl"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

/// CSS selectors for one product card. `name`, `price` and `url` are
/// evaluated inside each `item` element.
#[derive(Debug, Clone, Deserialize)]
pub struct Selectors {
    pub item: String,
    pub name: String,
    pub price: String,
    pub url: String,
    #[serde(default = "default_attr_url")]
    pub attr_url: String,
}

fn default_price_regex() -> String {
    r"[\d\s,.]+".into()
}

fn default_max_pages() -> u32 {
    5
}

fn default_next_selector() -> String {
    "a.next".into()
}

fn default_attr_url() -> String {
    "href".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl SitesConfig {
    pub fn from_toml(input: &str) -> Result<Self, ScrapeError> {
        let config: SitesConfig =
            toml::from_str(input).map_err(|e| ScrapeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.sites.is_empty() {
            return Err(ScrapeError::ConfigValidation(
                "at least one site is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for site in &self.sites {
            if !names.insert(site.name.as_str()) {
                return Err(ScrapeError::ConfigValidation(format!(
                    "duplicate site name '{}'",
                    site.name
                )));
            }
            if site.list_urls.is_empty() {
                return Err(ScrapeError::ConfigValidation(format!(
                    "site '{}': list_urls is empty",
                    site.name
                )));
            }
            // Compiling the extractor checks every selector and the regex.
            crate::extract::SiteExtractor::new(site)?;
            if let Some(wait_for) = &site.wait_for {
                crate::extract::compile_selector(&site.name, wait_for)?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
