//! CSV readers and writers for the pipeline tables.
//!
//! Readers take the file contents as `&str` and writers take any
//! `io::Write`; callers own the files.

use std::io;

use crate::error::ReconError;
use crate::model::{
    CatalogItem, ComparisonRow, MatchResult, PricePosition, Recommendation, ScrapedListing,
};
use crate::text::parse_price;

pub const CATALOG_COLUMNS: [&str; 6] = ["sku", "name", "brand", "category", "cost", "current_price"];

pub const LISTING_COLUMNS: [&str; 4] = ["site", "name", "price", "url"];

pub const MATCH_COLUMNS: [&str; 6] = [
    "source_site", "comp_name", "comp_price", "comp_url", "sku", "match_score",
];

pub const COMPARISON_COLUMNS: [&str; 13] = [
    "sku", "name", "brand", "category", "cost", "current_price",
    "min_comp_price", "max_comp_price", "avg_comp_price", "price_difference",
    "price_position", "competitors", "comp_products",
];

pub const RECOMMENDATION_COLUMNS: [&str; 8] = [
    "sku", "name", "current_price", "min_comp_price", "recommended_price",
    "action", "reason", "min_allowed_price",
];

/// `comp_products` is stored as one cell holding a JSON array of strings, so
/// names containing any separator or empty names survive a round trip.
fn encode_products(products: &[String]) -> Result<String, ReconError> {
    serde_json::to_string(products).map_err(|e| ReconError::Csv(e.to_string()))
}

/// Scraped listings plus the number of rows dropped for having no usable price.
#[derive(Debug, Default)]
pub struct ListingLoad {
    pub listings: Vec<ScrapedListing>,
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parsed CSV with a resolved column index per required header.
struct Table {
    name: &'static str,
    records: Vec<csv::StringRecord>,
    index: Vec<usize>,
}

impl Table {
    fn parse(name: &'static str, csv_data: &str, columns: &[&str]) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let index = columns
            .iter()
            .map(|column| {
                headers.iter().position(|h| h.as_str() == *column).ok_or_else(|| {
                    ReconError::MissingColumn {
                        table: name.into(),
                        column: (*column).into(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, records, index })
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().enumerate().map(move |(i, record)| Row {
            table: self,
            number: i + 1,
            record,
        })
    }
}

struct Row<'a> {
    table: &'a Table,
    number: usize,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    /// Cell for the n-th required column; short rows read as empty.
    fn get(&self, column: usize) -> &str {
        self.record.get(self.table.index[column]).unwrap_or("")
    }

    fn error(&self, column: &str, value: &str) -> ReconError {
        ReconError::ValueParse {
            table: self.table.name.into(),
            row: self.number,
            column: column.into(),
            value: value.into(),
        }
    }

    fn money(&self, column: usize, label: &str) -> Result<f64, ReconError> {
        let raw = self.get(column);
        parse_money(raw).ok_or_else(|| self.error(label, raw))
    }

    fn count(&self, column: usize, label: &str) -> Result<usize, ReconError> {
        let raw = self.get(column);
        raw.parse().map_err(|_| self.error(label, raw))
    }
}

/// Plain numbers first, then the noisy-text extractor.
fn parse_money(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .or_else(|| parse_price(raw))
}

pub fn read_catalog(csv_data: &str) -> Result<Vec<CatalogItem>, ReconError> {
    let table = Table::parse("catalog", csv_data, &CATALOG_COLUMNS)?;
    let mut seen = std::collections::HashSet::new();
    let mut items = Vec::with_capacity(table.records.len());

    for row in table.rows() {
        let sku = row.get(0).to_string();
        if sku.is_empty() {
            return Err(row.error("sku", ""));
        }
        if !seen.insert(sku.clone()) {
            return Err(ReconError::DuplicateSku(sku));
        }
        items.push(CatalogItem {
            name: row.get(1).to_string(),
            brand: row.get(2).to_string(),
            category: row.get(3).to_string(),
            cost: row.money(4, "cost")?,
            current_price: row.money(5, "current_price")?,
            sku,
        });
    }

    Ok(items)
}

/// Rows whose price cannot be read are dropped and counted, never fatal.
pub fn read_listings(csv_data: &str) -> Result<ListingLoad, ReconError> {
    let table = Table::parse("listings", csv_data, &LISTING_COLUMNS)?;
    let mut load = ListingLoad::default();

    for row in table.rows() {
        let Some(price) = parse_money(row.get(2)) else {
            log::debug!("listings row {}: unparseable price '{}'", row.number, row.get(2));
            load.skipped += 1;
            continue;
        };
        load.listings.push(ScrapedListing {
            site: row.get(0).to_string(),
            name: row.get(1).to_string(),
            price,
            url: row.get(3).to_string(),
        });
    }

    Ok(load)
}

pub fn read_matches(csv_data: &str) -> Result<Vec<MatchResult>, ReconError> {
    let table = Table::parse("matched", csv_data, &MATCH_COLUMNS)?;
    table
        .rows()
        .map(|row| -> Result<MatchResult, ReconError> {
            Ok(MatchResult {
                source_site: row.get(0).to_string(),
                comp_name: row.get(1).to_string(),
                comp_price: row.money(2, "comp_price")?,
                comp_url: row.get(3).to_string(),
                sku: row.get(4).to_string(),
                match_score: row.money(5, "match_score")?,
            })
        })
        .collect()
}

pub fn read_comparison(csv_data: &str) -> Result<Vec<ComparisonRow>, ReconError> {
    let table = Table::parse("comparison", csv_data, &COMPARISON_COLUMNS)?;
    table
        .rows()
        .map(|row| -> Result<ComparisonRow, ReconError> {
            let position = row.get(10);
            let products = row.get(12);
            let comp_products = if products.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str::<Vec<String>>(products)
                    .map_err(|_| row.error("comp_products", products))?
            };
            Ok(ComparisonRow {
                sku: row.get(0).to_string(),
                name: row.get(1).to_string(),
                brand: row.get(2).to_string(),
                category: row.get(3).to_string(),
                cost: row.money(4, "cost")?,
                current_price: row.money(5, "current_price")?,
                min_comp_price: row.money(6, "min_comp_price")?,
                max_comp_price: row.money(7, "max_comp_price")?,
                avg_comp_price: row.money(8, "avg_comp_price")?,
                price_difference: row.money(9, "price_difference")?,
                price_position: PricePosition::parse(position)
                    .ok_or_else(|| row.error("price_position", position))?,
                competitors: row.count(11, "competitors")?,
                comp_products,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn num(v: f64) -> String {
    v.to_string()
}

fn write_rows<W, T, F>(out: W, header: &[&str], rows: &[T], to_record: F) -> Result<(), ReconError>
where
    W: io::Write,
    F: Fn(&T) -> Result<Vec<String>, ReconError>,
{
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(to_record(row)?)?;
    }
    writer.flush().map_err(|e| ReconError::Io(e.to_string()))
}

pub fn write_listings<W: io::Write>(out: W, rows: &[ScrapedListing]) -> Result<(), ReconError> {
    write_rows(out, &LISTING_COLUMNS, rows, |l| {
        Ok(vec![l.site.clone(), l.name.clone(), num(l.price), l.url.clone()])
    })
}

pub fn write_matches<W: io::Write>(out: W, rows: &[MatchResult]) -> Result<(), ReconError> {
    write_rows(out, &MATCH_COLUMNS, rows, |m| {
        Ok(vec![
            m.source_site.clone(),
            m.comp_name.clone(),
            num(m.comp_price),
            m.comp_url.clone(),
            m.sku.clone(),
            num(m.match_score),
        ])
    })
}

pub fn write_comparison<W: io::Write>(out: W, rows: &[ComparisonRow]) -> Result<(), ReconError> {
    write_rows(out, &COMPARISON_COLUMNS, rows, |r| {
        Ok(vec![
            r.sku.clone(),
            r.name.clone(),
            r.brand.clone(),
            r.category.clone(),
            num(r.cost),
            num(r.current_price),
            num(r.min_comp_price),
            num(r.max_comp_price),
            num(r.avg_comp_price),
            num(r.price_difference),
            r.price_position.to_string(),
            r.competitors.to_string(),
            encode_products(&r.comp_products)?,
        ])
    })
}

pub fn write_recommendations<W: io::Write>(
    out: W,
    rows: &[Recommendation],
) -> Result<(), ReconError> {
    write_rows(out, &RECOMMENDATION_COLUMNS, rows, |r| {
        Ok(vec![
            r.sku.clone(),
            r.name.clone(),
            num(r.current_price),
            r.min_comp_price.map(num).unwrap_or_default(),
            num(r.recommended_price),
            r.action.to_string(),
            r.reason.clone(),
            num(r.min_allowed_price),
        ])
    })
}
