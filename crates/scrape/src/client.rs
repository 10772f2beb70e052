//! Page fetching and per-site scrape loop.
//!
//! Blocking reqwest client (no Tokio runtime required).

use std::collections::{BTreeMap, HashSet};
use std::thread;
use std::time::Duration;

use pricewatch_recon::model::ScrapedListing;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::Serialize;

use crate::config::{HttpConfig, SiteConfig, SiteKind};
use crate::error::ScrapeError;
use crate::extract::{SiteExtractor, SkipReason};

/// Source of page HTML. The scrape loop only talks to this trait.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// HTTP fetcher (blocking).
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        let lang = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            ScrapeError::ConfigValidation(format!("invalid accept_language: {e}"))
        })?;
        headers.insert(ACCEPT_LANGUAGE, lang);

        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        Ok(Self { http })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Http(status.as_u16(), url.to_string()));
        }

        response.text().map_err(|e| ScrapeError::Network(e.to_string()))
    }
}

/// Outcome of scraping one site.
#[derive(Debug, Default, Serialize)]
pub struct ScrapeReport {
    pub site: String,
    pub listings: Vec<ScrapedListing>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ScrapeReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Scrape every list URL of `site`.
///
/// `crawl` sites follow next-page links up to `max_pages`; `static` and
/// `browser` sites read each list URL once. Page-level failures are logged and counted; the run continues with the
/// next page. `delay` is slept between consecutive requests.
pub fn scrape_site(
    fetcher: &dyn PageFetcher,
    site: &SiteConfig,
    delay: Duration,
) -> Result<ScrapeReport, ScrapeError> {
    let mut report = ScrapeReport {
        site: site.name.clone(),
        ..Default::default()
    };

    let extractor = SiteExtractor::new(site)?;
    let page_limit = match site.kind {
        SiteKind::Crawl => site.max_pages.max(1) as usize,
        _ => 1,
    };

    let mut visited: HashSet<String> = HashSet::new();
    let mut first_request = true;

    for list_url in &site.list_urls {
        let mut next = Some(list_url.clone());
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= page_limit || !visited.insert(url.clone()) {
                break;
            }
            pages += 1;

            if !first_request && !delay.is_zero() {
                thread::sleep(delay);
            }
            first_request = false;

            let html = match fetcher.fetch(&url) {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("site '{}': {url}: {e}", site.name);
                    report.pages_failed += 1;
                    break;
                }
            };
            report.pages_fetched += 1;

            let page = extractor.extract(&html, &url);
            log::debug!(
                "site '{}': {url}: {} listings, {} skipped",
                site.name,
                page.listings.len(),
                page.skipped.len()
            );
            report.listings.extend(page.listings);
            for reason in page.skipped {
                *report.skipped.entry(reason).or_insert(0) += 1;
            }

            if site.kind == SiteKind::Crawl {
                next = page.next_page;
            }
        }
    }

    log::info!(
        "site '{}': {} listings from {} pages ({} failed, {} cards skipped)",
        site.name,
        report.listings.len(),
        report.pages_fetched,
        report.pages_failed,
        report.skipped_total()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selectors;
    use httpmock::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages and records every request.
    struct MockFetcher {
        pages: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl MockFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for MockFetcher {
        fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Http(404, url.to_string()))
        }
    }

    fn site(kind: SiteKind, list_urls: &[&str]) -> SiteConfig {
        SiteConfig {
            name: "shop".into(),
            kind,
            base_url: None,
            list_urls: list_urls.iter().map(|s| s.to_string()).collect(),
            selectors: Selectors {
                item: ".card".into(),
                name: ".name".into(),
                price: ".price".into(),
                url: "a".into(),
                attr_url: "href".into(),
            },
            price_regex: r"[\d\s,.]+".into(),
            max_pages: 3,
            next_selector: "a.next".into(),
            wait_for: None,
            scroll: false,
        }
    }

    fn page(cards: &[(&str, &str)], next: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        for (name, price) in cards {
            html.push_str(&format!(
                r#"<div class="card"><a href="/p"><span class="name">{name}</span></a><span class="price">{price}</span></div>"#
            ));
        }
        if let Some(next) = next {
            html.push_str(&format!(r#"<a class="next" href="{next}">next</a>"#));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn static_site_fetches_each_list_url_once() {
        let p1 = page(&[("Phone A", "100")], Some("/phones?page=2"));
        let p2 = page(&[("Laptop B", "900"), ("Broken", "n/a")], None);
        let fetcher = MockFetcher::new(&[
            ("https://shop.example/phones", p1.as_str()),
            ("https://shop.example/laptops", p2.as_str()),
        ]);
        let cfg = site(
            SiteKind::Static,
            &["https://shop.example/phones", "https://shop.example/laptops"],
        );

        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_failed, 0);
        assert_eq!(report.listings.len(), 2);
        assert_eq!(report.listings[0].url, "https://shop.example/p");
        assert_eq!(report.skipped[&SkipReason::UnparseablePrice], 1);
        assert_eq!(fetcher.requests.borrow().len(), 2);
    }

    #[test]
    fn crawl_follows_next_links_up_to_limit() {
        let p1 = page(&[("A", "1")], Some("/c?page=2"));
        let p2 = page(&[("B", "2")], Some("/c?page=3"));
        let p3 = page(&[("C", "3")], Some("/c?page=4"));
        let p4 = page(&[("D", "4")], None);
        let fetcher = MockFetcher::new(&[
            ("https://shop.example/c", p1.as_str()),
            ("https://shop.example/c?page=2", p2.as_str()),
            ("https://shop.example/c?page=3", p3.as_str()),
            ("https://shop.example/c?page=4", p4.as_str()),
        ]);
        let cfg = site(SiteKind::Crawl, &["https://shop.example/c"]);

        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();
        assert_eq!(report.pages_fetched, 3);
        let names: Vec<&str> = report.listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn crawl_stops_on_link_cycle() {
        let p1 = page(&[("A", "1")], Some("/c?page=2"));
        let p2 = page(&[("B", "2")], Some("/c"));
        let fetcher = MockFetcher::new(&[
            ("https://shop.example/c", p1.as_str()),
            ("https://shop.example/c?page=2", p2.as_str()),
        ]);
        let cfg = site(SiteKind::Crawl, &["https://shop.example/c"]);

        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(fetcher.requests.borrow().len(), 2);
    }

    #[test]
    fn failed_page_is_counted_and_run_continues() {
        let p2 = page(&[("B", "2")], None);
        let fetcher = MockFetcher::new(&[("https://shop.example/b", p2.as_str())]);
        let cfg = site(
            SiteKind::Static,
            &["https://shop.example/a", "https://shop.example/b"],
        );

        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.listings.len(), 1);
    }

    #[test]
    fn browser_site_reads_each_rendered_page_once() {
        let p1 = page(&[("A", "1"), ("B", "2")], Some("/spa?page=2"));
        let fetcher = MockFetcher::new(&[("https://shop.example/spa", p1.as_str())]);
        let cfg = site(SiteKind::Browser, &["https://shop.example/spa"]);

        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.listings.len(), 2);
        assert_eq!(*fetcher.requests.borrow(), ["https://shop.example/spa"]);
    }

    #[test]
    fn http_fetcher_builds_from_defaults() {
        assert!(HttpFetcher::new(&HttpConfig::default()).is_ok());
    }

    // -------------------------------------------------------------------
    // HttpFetcher against a local server
    // -------------------------------------------------------------------

    fn http_config() -> HttpConfig {
        HttpConfig {
            user_agent: "pricewatch-test/1.0".into(),
            accept_language: "ru-RU,ru;q=0.9".into(),
            timeout_secs: 5,
            delay_ms: 0,
        }
    }

    #[test]
    fn http_fetch_returns_body_and_sends_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/phones")
                .header("user-agent", "pricewatch-test/1.0")
                .header("accept-language", "ru-RU,ru;q=0.9");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body>ok</body></html>");
        });

        let fetcher = HttpFetcher::new(&http_config()).unwrap();
        let body = fetcher.fetch(&server.url("/phones")).unwrap();

        mock.assert();
        assert_eq!(body, "<html><body>ok</body></html>");
    }

    #[test]
    fn http_fetch_default_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/")
                .header("user-agent", format!("pricewatch/{}", env!("CARGO_PKG_VERSION")))
                .header("accept-language", "en-US,en;q=0.9");
            then.status(200).body("ok");
        });

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert_eq!(fetcher.fetch(&server.url("/")).unwrap(), "ok");
        mock.assert();
    }

    #[test]
    fn http_not_found_maps_to_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404).body("not here");
        });

        let url = server.url("/gone");
        let fetcher = HttpFetcher::new(&http_config()).unwrap();
        match fetcher.fetch(&url) {
            Err(ScrapeError::Http(404, failed)) => assert_eq!(failed, url),
            other => panic!("expected HTTP 404, got {other:?}"),
        }
    }

    #[test]
    fn crawl_against_http_server() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET).path("/c").query_param_missing("page");
            then.status(200)
                .body(page(&[("Phone A", "1 299"), ("Broken", "n/a")], Some("/c?page=2")));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/c").query_param("page", "2");
            then.status(200).body(page(&[("Phone B", "899")], None));
        });
        let broken = server.mock(|when, then| {
            when.method(GET).path("/down");
            then.status(503);
        });

        let (list, down) = (server.url("/c"), server.url("/down"));
        let cfg = site(SiteKind::Crawl, &[list.as_str(), down.as_str()]);
        let fetcher = HttpFetcher::new(&http_config()).unwrap();
        let report = scrape_site(&fetcher, &cfg, Duration::ZERO).unwrap();

        first.assert_calls(1);
        second.assert_calls(1);
        broken.assert_calls(1);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_failed, 1);
        let names: Vec<&str> = report.listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Phone A", "Phone B"]);
        assert_eq!(report.listings[0].price, 1299.0);
        assert_eq!(report.listings[1].url, server.url("/p"));
        assert_eq!(report.skipped_total(), 1);
    }
}
