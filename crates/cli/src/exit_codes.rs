//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `pricewatch` exit codes.
//! Exit codes are part of the shell contract; cron jobs and scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error (unspecified)                       |
//! | 2    | Usage error (bad args, missing input file)        |
//! | 3    | I/O error (read/write, network or browser setup)  |
//! | 4    | Invalid config (`pricing.toml` / `sites.toml`)    |
//! | 5    | Schema error in an input table                    |
//! | 6    | No competitor listing matched the catalog         |

use pricewatch_recon::ReconError;
use pricewatch_scrape::ScrapeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read or write a file, build the HTTP client or start the browser.
pub const EXIT_IO: u8 = 3;

/// A config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Missing column, duplicate SKU or unparseable cell in an input table.
pub const EXIT_SCHEMA: u8 = 5;

/// The run completed but no listing matched any catalog SKU.
pub const EXIT_NOTHING_MATCHED: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. }
        | ReconError::ValueParse { .. }
        | ReconError::DuplicateSku(_)
        | ReconError::Csv(_) => EXIT_SCHEMA,
        ReconError::Io(_) => EXIT_IO,
    }
}

/// Map a scraper error to its exit code.
pub fn scrape_exit_code(err: &ScrapeError) -> u8 {
    match err {
        ScrapeError::ConfigParse(_)
        | ScrapeError::ConfigValidation(_)
        | ScrapeError::Selector { .. }
        | ScrapeError::Regex { .. } => EXIT_INVALID_CONFIG,
        ScrapeError::Network(_) | ScrapeError::Http(..) | ScrapeError::Browser(_) => EXIT_IO,
    }
}
