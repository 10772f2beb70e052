//! Product card extraction from listing pages.

use pricewatch_recon::model::ScrapedListing;
use pricewatch_recon::text::parse_price;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::config::SiteConfig;
use crate::error::ScrapeError;

/// Why a product card produced no listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingName,
    MissingPrice,
    MissingUrl,
    UnparseablePrice,
    NonPositivePrice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing_name"),
            Self::MissingPrice => write!(f, "missing_price"),
            Self::MissingUrl => write!(f, "missing_url"),
            Self::UnparseablePrice => write!(f, "unparseable_price"),
            Self::NonPositivePrice => write!(f, "non_positive_price"),
        }
    }
}

/// Everything pulled out of one page.
#[derive(Debug, Default)]
pub struct PageExtract {
    pub listings: Vec<ScrapedListing>,
    pub skipped: Vec<SkipReason>,
    /// Absolute URL of the next page, if the page links one.
    pub next_page: Option<String>,
}

/// Compiled selectors and price pattern for one site.
pub struct SiteExtractor {
    site: String,
    item: Selector,
    name: Selector,
    price: Selector,
    url: Selector,
    next: Selector,
    attr_url: String,
    price_regex: Regex,
    base_url: Option<Url>,
}

impl SiteExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self, ScrapeError> {
        let compile = |selector: &str| compile_selector(&site.name, selector);

        let price_regex = Regex::new(&site.price_regex).map_err(|e| ScrapeError::Regex {
            site: site.name.clone(),
            message: e.to_string(),
        })?;

        let base_url = match site.base_url.as_deref() {
            Some(raw) if !raw.is_empty() => Some(Url::parse(raw).map_err(|e| {
                ScrapeError::ConfigValidation(format!(
                    "site '{}': invalid base_url '{raw}': {e}",
                    site.name
                ))
            })?),
            _ => None,
        };

        Ok(Self {
            site: site.name.clone(),
            item: compile(&site.selectors.item)?,
            name: compile(&site.selectors.name)?,
            price: compile(&site.selectors.price)?,
            url: compile(&site.selectors.url)?,
            next: compile(&site.next_selector)?,
            attr_url: site.selectors.attr_url.clone(),
            price_regex,
            base_url,
        })
    }

    /// Extract every product card from `html`. Card-level problems become
    /// skip reasons; they never fail the page.
    pub fn extract(&self, html: &str, page_url: &str) -> PageExtract {
        let document = Html::parse_document(html);
        let page = Url::parse(page_url).ok();
        let base = self.base_url.as_ref().or(page.as_ref());

        let mut out = PageExtract::default();
        for card in document.select(&self.item) {
            match self.extract_card(card, base, page_url) {
                Ok(listing) => out.listings.push(listing),
                Err(reason) => out.skipped.push(reason),
            }
        }

        out.next_page = document
            .select(&self.next)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(base, href));

        out
    }

    fn extract_card(
        &self,
        card: ElementRef<'_>,
        base: Option<&Url>,
        page_url: &str,
    ) -> Result<ScrapedListing, SkipReason> {
        let name_el = card.select(&self.name).next().ok_or(SkipReason::MissingName)?;
        let price_el = card.select(&self.price).next().ok_or(SkipReason::MissingPrice)?;
        let url_el = card.select(&self.url).next().ok_or(SkipReason::MissingUrl)?;

        let name = element_text(name_el);
        if name.is_empty() {
            return Err(SkipReason::MissingName);
        }

        let price_text = element_text(price_el);
        let price = self
            .price_regex
            .find(&price_text)
            .and_then(|m| parse_price(m.as_str()))
            .ok_or(SkipReason::UnparseablePrice)?;
        if price <= 0.0 {
            return Err(SkipReason::NonPositivePrice);
        }

        let url = url_el
            .value()
            .attr(&self.attr_url)
            .filter(|href| !href.trim().is_empty())
            .map(|href| resolve(base, href).unwrap_or_else(|| href.to_string()))
            .unwrap_or_else(|| page_url.to_string());

        Ok(ScrapedListing {
            site: self.site.clone(),
            name,
            price,
            url,
        })
    }
}

pub(crate) fn compile_selector(site: &str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        site: site.to_string(),
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text content with whitespace runs collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteKind, Selectors};

    fn site(base_url: Option<&str>) -> SiteConfig {
        SiteConfig {
            name: "techmart".into(),
            kind: SiteKind::Static,
            base_url: base_url.map(String::from),
            list_urls: vec!["https://techmart.example/phones".into()],
            selectors: Selectors {
                item: ".card".into(),
                name: ".title".into(),
                price: ".price".into(),
                url: "a".into(),
                attr_url: "href".into(),
            },
            price_regex: r"[\d\s,.]+".into(),
            max_pages: 5,
            next_selector: "a.next".into(),
            wait_for: None,
            scroll: false,
        }
    }

    const PAGE: &str = r#"
<html><body>
  <div class="card">
    <a href="/p/101"><span class="title">Apple   iPhone 15
      <b>128GB</b></span></a>
    <span class="price">1&nbsp;299,00 ₽</span>
  </div>
  <div class="card">
    <a href="https://cdn.example/p/102"><span class="title">Galaxy S24</span></a>
    <span class="price">Price: 899</span>
  </div>
  <div class="card">
    <a href="/p/103"><span class="title">No price here</span></a>
  </div>
  <div class="card">
    <a href="/p/104"><span class="title">Call for price</span></a>
    <span class="price">call us</span>
  </div>
  <div class="card">
    <a href="/p/105"><span class="title">Free sample</span></a>
    <span class="price">0</span>
  </div>
  <div class="card">
    <span class="title">Linkless</span>
    <span class="price">10</span>
  </div>
  <a class="next" href="?page=2">Next</a>
</body></html>
"#;

    #[test]
    fn extracts_cards_and_skip_reasons() {
        let ex = SiteExtractor::new(&site(None)).unwrap();
        let out = ex.extract(PAGE, "https://techmart.example/phones");

        assert_eq!(out.listings.len(), 2);
        let first = &out.listings[0];
        assert_eq!(first.site, "techmart");
        assert_eq!(first.name, "Apple iPhone 15 128GB");
        assert_eq!(first.price, 1299.0);
        assert_eq!(first.url, "https://techmart.example/p/101");

        let second = &out.listings[1];
        assert_eq!(second.price, 899.0);
        assert_eq!(second.url, "https://cdn.example/p/102");

        assert_eq!(
            out.skipped,
            vec![
                SkipReason::MissingPrice,
                SkipReason::UnparseablePrice,
                SkipReason::NonPositivePrice,
                SkipReason::MissingUrl,
            ]
        );
        assert_eq!(
            out.next_page.as_deref(),
            Some("https://techmart.example/phones?page=2")
        );
    }

    #[test]
    fn base_url_overrides_page_url() {
        let ex = SiteExtractor::new(&site(Some("https://shop.example/"))).unwrap();
        let out = ex.extract(PAGE, "https://mirror.example/phones");
        assert_eq!(out.listings[0].url, "https://shop.example/p/101");
    }

    #[test]
    fn digit_led_pattern_skips_leading_words() {
        let html = r#"<div class="card"><a href="/p/1"><span class="title">X</span></a>
            <span class="price">Price is 1 299 ₽</span></div>"#;

        let ex = SiteExtractor::new(&site(None)).unwrap();
        let out = ex.extract(html, "https://techmart.example/");
        assert_eq!(out.skipped, vec![SkipReason::UnparseablePrice]);

        let mut cfg = site(None);
        cfg.price_regex = r"\d[\d\s,.]*".into();
        let out = SiteExtractor::new(&cfg).unwrap().extract(html, "https://techmart.example/");
        assert_eq!(out.listings[0].price, 1299.0);
    }

    #[test]
    fn page_without_cards() {
        let ex = SiteExtractor::new(&site(None)).unwrap();
        let out = ex.extract("<html><body><p>empty</p></body></html>", "https://x.example/");
        assert!(out.listings.is_empty());
        assert!(out.skipped.is_empty());
        assert!(out.next_page.is_none());
    }
}
