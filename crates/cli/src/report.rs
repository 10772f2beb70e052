//! Human-readable summaries printed after each stage.

use std::io::{self, Write};

use pricewatch_recon::model::{ComparisonRow, Recommendation, RunSummary};
use pricewatch_scrape::ScrapeReport;

const NAME_WIDTH: usize = 32;

/// One line per compared SKU.
pub fn write_comparison_summary(out: &mut impl Write, rows: &[ComparisonRow]) -> io::Result<()> {
    for row in rows {
        writeln!(
            out,
            "{:<10} {:<width$} our {:>10.2}  min {:>10.2}  avg {:>10.2}  {:<9}  ({} offers)",
            row.sku,
            clip(&row.name),
            row.current_price,
            row.min_comp_price,
            row.avg_comp_price,
            row.price_position,
            row.competitors,
            width = NAME_WIDTH,
        )?;
    }
    Ok(())
}

/// One line per recommendation.
pub fn write_recommendation_summary(
    out: &mut impl Write,
    recs: &[Recommendation],
) -> io::Result<()> {
    for rec in recs {
        writeln!(
            out,
            "{:<10} {:<8} {:>10.2} -> {:>10.2}  {}",
            rec.sku, rec.action, rec.current_price, rec.recommended_price, rec.reason,
        )?;
    }
    Ok(())
}

pub fn write_run_totals(out: &mut impl Write, s: &RunSummary) -> io::Result<()> {
    let actions: Vec<String> = s
        .action_counts
        .iter()
        .map(|(action, n)| format!("{n} {action}"))
        .collect();
    writeln!(
        out,
        "{} of {} listings matched, {} skus compared ({} cheapest, {} above min); {}",
        s.matched,
        s.listings,
        s.compared_skus,
        s.cheapest,
        s.above_min,
        if actions.is_empty() { "no recommendations".to_string() } else { actions.join(", ") },
    )
}

pub fn write_scrape_line(out: &mut impl Write, report: &ScrapeReport) -> io::Result<()> {
    writeln!(
        out,
        "site '{}': {} listings ({} pages, {} failed, {} cards skipped)",
        report.site,
        report.listings.len(),
        report.pages_fetched,
        report.pages_failed,
        report.skipped_total(),
    )
}

fn clip(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_string();
    }
    let mut s: String = name.chars().take(NAME_WIDTH - 1).collect();
    s.push('~');
    s
}
