//! Stage commands: `scrape`, `analyze`, `recommend`, `run-all`, `run`, `validate`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pricewatch_recon::aggregate::aggregate_matches;
use pricewatch_recon::matcher::match_listings;
use pricewatch_recon::model::{
    CatalogItem, ComparisonRow, ReconInput, Recommendation, ScrapedListing,
};
use pricewatch_recon::recommend::recommend;
use pricewatch_recon::table::{
    read_catalog, read_comparison, read_listings, write_comparison, write_listings,
    write_matches, write_recommendations,
};
use pricewatch_recon::{ReconConfig, ReconError};
use pricewatch_scrape::{scrape_site, BrowserFetcher, HttpFetcher, SiteKind};

use crate::exit_codes::{
    recon_exit_code, scrape_exit_code, EXIT_ERROR, EXIT_IO, EXIT_NOTHING_MATCHED,
};
use crate::project::{
    create_file, read_text, Project, COMPARISON_FILE, MATCHED_FILE, RECOMMENDATIONS_FILE,
    SCRAPED_FILE,
};
use crate::report;
use crate::CliError;

fn table_err(path: &Path, e: ReconError) -> CliError {
    CliError::new(recon_exit_code(&e), format!("{}: {e}", path.display()))
}

fn console_err(e: io::Error) -> CliError {
    CliError::new(EXIT_IO, format!("cannot write to console: {e}"))
}

fn nothing_matched() -> CliError {
    CliError::new(EXIT_NOTHING_MATCHED, "no competitor listing matched the catalog")
        .with_hint("lower [matching] match_threshold in pricing.toml or check the scraped names")
}

fn load_catalog(project: &Project) -> Result<Vec<CatalogItem>, CliError> {
    let text = read_text(&project.catalog)?;
    let catalog = read_catalog(&text).map_err(|e| table_err(&project.catalog, e))?;
    tracing::info!("catalog: {} items from {}", catalog.len(), project.catalog.display());
    Ok(catalog)
}

fn load_listings(path: &Path) -> Result<Vec<ScrapedListing>, CliError> {
    let text = read_text(path).map_err(|e| {
        e.with_hint("run `pricewatch scrape` first or pass --scraped <path>")
    })?;
    let load = read_listings(&text).map_err(|e| table_err(path, e))?;
    if load.skipped > 0 {
        tracing::warn!("{}: skipped {} rows without a usable price", path.display(), load.skipped);
    }
    Ok(load.listings)
}

/// Write one table through `write` and report the path on stderr.
fn write_table<T>(
    path: &Path,
    rows: &[T],
    write: impl FnOnce(std::fs::File, &[T]) -> Result<(), ReconError>,
) -> Result<(), CliError> {
    let file = create_file(path)?;
    write(file, rows).map_err(|e| table_err(path, e))?;
    eprintln!("wrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn scrape_stage(project: &Project) -> Result<Vec<ScrapedListing>, CliError> {
    let sites = project.load_sites()?;
    let fetcher = HttpFetcher::new(&sites.http)
        .map_err(|e| CliError::new(scrape_exit_code(&e), e.to_string()))?;
    let delay = Duration::from_millis(sites.http.delay_ms);

    // One Chrome process for every browser site, started only if one exists.
    let browser = if sites.sites.iter().any(|s| s.kind == SiteKind::Browser) {
        let browser = BrowserFetcher::launch(&sites.http).map_err(|e| {
            CliError::new(scrape_exit_code(&e), e.to_string())
                .with_hint("sites with kind = \"browser\" need Chrome or Chromium installed")
        })?;
        Some(browser)
    } else {
        None
    };

    let mut listings = Vec::new();
    for site in &sites.sites {
        let scraped = match (&browser, site.kind) {
            (Some(browser), SiteKind::Browser) => {
                scrape_site(&browser.for_site(site), site, delay)
            }
            _ => scrape_site(&fetcher, site, delay),
        };
        let site_report =
            scraped.map_err(|e| CliError::new(scrape_exit_code(&e), e.to_string()))?;
        report::write_scrape_line(&mut io::stderr(), &site_report).map_err(console_err)?;
        listings.extend(site_report.listings);
    }

    if listings.is_empty() {
        tracing::warn!("no listings scraped from {} site(s)", sites.sites.len());
    }

    project.ensure_out_dir()?;
    write_table(&project.out_file(SCRAPED_FILE), &listings, |f, r| write_listings(f, r))?;
    Ok(listings)
}

fn analyze_stage(
    project: &Project,
    config: &ReconConfig,
    catalog: &[CatalogItem],
    listings: &[ScrapedListing],
) -> Result<Vec<ComparisonRow>, CliError> {
    let matches = match_listings(listings, catalog, &config.matching);
    let comparison = aggregate_matches(&matches, catalog);

    project.ensure_out_dir()?;
    write_table(&project.out_file(MATCHED_FILE), &matches, |f, r| write_matches(f, r))?;
    write_table(&project.out_file(COMPARISON_FILE), &comparison, |f, r| {
        write_comparison(f, r)
    })?;

    report::write_comparison_summary(&mut io::stdout().lock(), &comparison)
        .map_err(console_err)?;

    if matches.is_empty() {
        return Err(nothing_matched());
    }
    Ok(comparison)
}

fn recommend_stage(
    project: &Project,
    config: &ReconConfig,
    catalog: &[CatalogItem],
    comparison: &[ComparisonRow],
) -> Result<Vec<Recommendation>, CliError> {
    let recs = recommend(comparison, catalog, &config.pricing);

    project.ensure_out_dir()?;
    write_table(&project.out_file(RECOMMENDATIONS_FILE), &recs, |f, r| {
        write_recommendations(f, r)
    })?;

    report::write_recommendation_summary(&mut io::stdout().lock(), &recs).map_err(console_err)?;
    Ok(recs)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_scrape(project: &Project) -> Result<(), CliError> {
    scrape_stage(project).map(|_| ())
}

pub fn cmd_analyze(project: &Project, scraped: Option<PathBuf>) -> Result<(), CliError> {
    let config = project.load_pricing()?;
    let catalog = load_catalog(project)?;
    let scraped = scraped.unwrap_or_else(|| project.out_file(SCRAPED_FILE));
    let listings = load_listings(&scraped)?;
    analyze_stage(project, &config, &catalog, &listings).map(|_| ())
}

pub fn cmd_recommend(project: &Project, comparison: Option<PathBuf>) -> Result<(), CliError> {
    let config = project.load_pricing()?;
    let catalog = load_catalog(project)?;
    let path = comparison.unwrap_or_else(|| project.out_file(COMPARISON_FILE));
    let text = read_text(&path)
        .map_err(|e| e.with_hint("run `pricewatch analyze` first or pass --comparison <path>"))?;
    let rows = read_comparison(&text).map_err(|e| table_err(&path, e))?;
    recommend_stage(project, &config, &catalog, &rows).map(|_| ())
}

pub fn cmd_run_all(project: &Project) -> Result<(), CliError> {
    // Fail on bad pricing rules before spending time on the network.
    let config = project.load_pricing()?;
    let catalog = load_catalog(project)?;
    let listings = scrape_stage(project)?;
    let comparison = analyze_stage(project, &config, &catalog, &listings)?;
    recommend_stage(project, &config, &catalog, &comparison).map(|_| ())
}

pub fn cmd_run(
    project: &Project,
    scraped: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = project.load_pricing()?;
    let catalog = load_catalog(project)?;
    let scraped = scraped.unwrap_or_else(|| project.out_file(SCRAPED_FILE));
    let listings = load_listings(&scraped)?;

    let input = ReconInput { catalog, listings };
    let result = pricewatch_recon::run(&config, &input);

    project.ensure_out_dir()?;
    write_table(&project.out_file(MATCHED_FILE), &result.matches, |f, r| write_matches(f, r))?;
    write_table(&project.out_file(COMPARISON_FILE), &result.comparison, |f, r| {
        write_comparison(f, r)
    })?;
    write_table(&project.out_file(RECOMMENDATIONS_FILE), &result.recommendations, |f, r| {
        write_recommendations(f, r)
    })?;

    if json || output.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = output {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_IO, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }

    if !json {
        let mut stdout = io::stdout().lock();
        report::write_recommendation_summary(&mut stdout, &result.recommendations)
            .map_err(console_err)?;
        report::write_run_totals(&mut stdout, &result.summary).map_err(console_err)?;
        stdout.flush().map_err(console_err)?;
    }

    if result.summary.matched == 0 {
        return Err(nothing_matched());
    }
    Ok(())
}

pub fn cmd_validate(project: &Project) -> Result<(), CliError> {
    let config = project.load_pricing()?;
    let m = &config.matching;
    let p = &config.pricing;
    eprintln!(
        "valid: pricing (threshold {}, brand boost {}, margin {}%, round to {})",
        m.match_threshold, m.brand_boost, p.min_margin_percent, p.round_to,
    );

    let sites = project.load_sites()?;
    let count = |kind: SiteKind| sites.sites.iter().filter(|s| s.kind == kind).count();
    eprintln!(
        "valid: {} site(s) ({} static, {} crawl, {} browser)",
        sites.sites.len(),
        count(SiteKind::Static),
        count(SiteKind::Crawl),
        count(SiteKind::Browser),
    );
    Ok(())
}
