//! Headless Chrome rendering for listing pages built by JavaScript.
//!
//! A `BrowserFetcher` owns one Chrome process for the whole run. Each
//! `browser` site borrows it through `for_site`, which yields a
//! `PageFetcher`, so the scrape loop and card extraction stay the same as
//! for plain HTTP sites.

use std::thread;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::client::PageFetcher;
use crate::config::{HttpConfig, SiteConfig};
use crate::error::ScrapeError;

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Pause after each scroll so lazy-loaded cards can arrive.
const SCROLL_PAUSE: Duration = Duration::from_millis(1500);

/// Upper bound on scroll steps for pages that never stop growing.
const MAX_SCROLLS: usize = 30;

fn browser_err(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Browser(e.to_string())
}

pub struct BrowserFetcher {
    browser: Browser,
    user_agent: String,
    accept_language: String,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Start headless Chrome. Fails when no Chrome/Chromium binary is found.
    pub fn launch(config: &HttpConfig) -> Result<Self, ScrapeError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some(WINDOW_SIZE))
            .build()
            .map_err(browser_err)?;
        let browser = Browser::new(options).map_err(browser_err)?;
        log::debug!("headless browser started");

        Ok(Self {
            browser,
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Page source for `site`, rendered with its wait and scroll settings.
    pub fn for_site<'a>(&'a self, site: &'a SiteConfig) -> RenderedPages<'a> {
        RenderedPages {
            fetcher: self,
            wait_for: site.wait_selector(),
            scroll: site.scroll,
        }
    }
}

pub struct RenderedPages<'a> {
    fetcher: &'a BrowserFetcher,
    wait_for: &'a str,
    scroll: bool,
}

impl PageFetcher for RenderedPages<'_> {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let tab = self.fetcher.browser.new_tab().map_err(browser_err)?;
        let html = self.render(&tab, url);
        if let Err(e) = tab.close(false) {
            log::debug!("{url}: closing tab: {e}");
        }
        html
    }
}

impl RenderedPages<'_> {
    fn render(&self, tab: &Tab, url: &str) -> Result<String, ScrapeError> {
        let f = self.fetcher;
        tab.set_default_timeout(f.timeout);
        tab.set_user_agent(&f.user_agent, Some(&f.accept_language), None)
            .map_err(browser_err)?;

        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ScrapeError::Browser(format!("{url}: {e}")))?;
        tab.wait_for_element(self.wait_for).map_err(|e| {
            ScrapeError::Browser(format!("{url}: '{}' did not appear: {e}", self.wait_for))
        })?;

        if self.scroll {
            let steps = scroll_to_end(tab)?;
            log::debug!("{url}: scrolled {steps} time(s)");
        }

        tab.get_content().map_err(browser_err)
    }
}

fn page_height(tab: &Tab) -> Result<Option<f64>, ScrapeError> {
    let height = tab
        .evaluate("document.body.scrollHeight", false)
        .map_err(browser_err)?;
    Ok(height.value.and_then(|v| v.as_f64()))
}

/// Scroll to the bottom until the document height stops changing.
fn scroll_to_end(tab: &Tab) -> Result<usize, ScrapeError> {
    let mut last = page_height(tab)?;
    for step in 1..=MAX_SCROLLS {
        tab.evaluate("window.scrollTo(0, document.body.scrollHeight)", false)
            .map_err(browser_err)?;
        thread::sleep(SCROLL_PAUSE);

        let height = page_height(tab)?;
        if height == last {
            return Ok(step);
        }
        last = height;
    }
    Ok(MAX_SCROLLS)
}
