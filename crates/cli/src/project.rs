//! Project layout: where configs, inputs and outputs live.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use pricewatch_recon::ReconConfig;
use pricewatch_scrape::SitesConfig;

use crate::exit_codes::{recon_exit_code, scrape_exit_code, EXIT_IO, EXIT_USAGE};
use crate::CliError;

pub const SCRAPED_FILE: &str = "scraped_prices.csv";
pub const MATCHED_FILE: &str = "matched.csv";
pub const COMPARISON_FILE: &str = "comparison.csv";
pub const RECOMMENDATIONS_FILE: &str = "recommendations.csv";

/// Path flags shared by every subcommand. Unset paths resolve inside the
/// project directory.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory
    #[arg(long, short = 'C', global = true, default_value = ".", env = "PRICEWATCH_PROJECT")]
    pub project: PathBuf,

    /// Pricing config [default: <project>/config/pricing.toml]
    #[arg(long, global = true)]
    pub pricing: Option<PathBuf>,

    /// Sites config [default: <project>/config/sites.toml]
    #[arg(long, global = true)]
    pub sites: Option<PathBuf>,

    /// Catalog table [default: <project>/data/catalog.csv]
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output directory [default: <project>/out]
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,
}

/// Fully resolved paths for one invocation.
#[derive(Debug, Clone)]
pub struct Project {
    pub pricing: PathBuf,
    pub sites: PathBuf,
    pub catalog: PathBuf,
    pub out: PathBuf,
}

impl Project {
    pub fn resolve(args: &ProjectArgs) -> Self {
        let root = &args.project;
        Self {
            pricing: args
                .pricing
                .clone()
                .unwrap_or_else(|| root.join("config").join("pricing.toml")),
            sites: args
                .sites
                .clone()
                .unwrap_or_else(|| root.join("config").join("sites.toml")),
            catalog: args
                .catalog
                .clone()
                .unwrap_or_else(|| root.join("data").join("catalog.csv")),
            out: args.out.clone().unwrap_or_else(|| root.join("out")),
        }
    }

    pub fn out_file(&self, name: &str) -> PathBuf {
        self.out.join(name)
    }

    /// Load `pricing.toml`. A missing file means defaults.
    pub fn load_pricing(&self) -> Result<ReconConfig, CliError> {
        if !self.pricing.exists() {
            tracing::warn!(
                "{} not found, using default pricing rules",
                self.pricing.display()
            );
            return Ok(ReconConfig::default());
        }
        let text = read_text(&self.pricing)?;
        ReconConfig::from_toml(&text).map_err(|e| {
            CliError::new(recon_exit_code(&e), format!("{}: {e}", self.pricing.display()))
        })
    }

    pub fn load_sites(&self) -> Result<SitesConfig, CliError> {
        if !self.sites.exists() {
            return Err(CliError::new(
                EXIT_USAGE,
                format!("sites config not found: {}", self.sites.display()),
            )
            .with_hint("create config/sites.toml or pass --sites <path>"));
        }
        let text = read_text(&self.sites)?;
        SitesConfig::from_toml(&text).map_err(|e| {
            CliError::new(scrape_exit_code(&e), format!("{}: {e}", self.sites.display()))
        })
    }

    pub fn ensure_out_dir(&self) -> Result<(), CliError> {
        fs::create_dir_all(&self.out).map_err(|e| {
            CliError::new(EXIT_IO, format!("cannot create {}: {e}", self.out.display()))
        })
    }
}

/// Read an input file. A missing file is a usage error, anything else is I/O.
pub fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::NotFound { EXIT_USAGE } else { EXIT_IO };
        CliError::new(code, format!("cannot read {}: {e}", path.display()))
    })
}

/// Create `path` for writing a table.
pub fn create_file(path: &Path) -> Result<fs::File, CliError> {
    fs::File::create(path)
        .map_err(|e| CliError::new(EXIT_IO, format!("cannot write {}: {e}", path.display())))
}
