// pricewatch CLI - competitor price monitoring and repricing

mod exit_codes;
mod pipeline;
mod project;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;
use project::{Project, ProjectArgs};

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Match competitor listings to the catalog and recommend prices")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(flatten)]
    project: ProjectArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured site into out/scraped_prices.csv
    #[command(after_help = "\
Examples:
  pricewatch scrape
  pricewatch -C shop scrape --sites shop/config/sites.staging.toml")]
    Scrape,

    /// Match scraped listings to the catalog and compare prices
    #[command(after_help = "\
Writes out/matched.csv and out/comparison.csv and prints one line per SKU.
Exit code 6 means no listing matched the catalog.

Examples:
  pricewatch analyze
  pricewatch analyze --scraped archive/2024-05-01.csv")]
    Analyze {
        /// Scraped listings table [default: <out>/scraped_prices.csv]
        #[arg(long)]
        scraped: Option<PathBuf>,
    },

    /// Apply the pricing rules to the comparison table
    #[command(after_help = "\
Examples:
  pricewatch recommend
  pricewatch recommend --comparison out/comparison.csv --pricing config/aggressive.toml")]
    Recommend {
        /// Comparison table [default: <out>/comparison.csv]
        #[arg(long)]
        comparison: Option<PathBuf>,
    },

    /// Scrape, analyze and recommend in sequence
    RunAll,

    /// Analyze and recommend from an existing scrape in one pass
    #[command(after_help = "\
Examples:
  pricewatch run
  pricewatch run --json | jq .summary
  pricewatch run --output out/run.json")]
    Run {
        /// Scraped listings table [default: <out>/scraped_prices.csv]
        #[arg(long)]
        scraped: Option<PathBuf>,

        /// Print the full run result as JSON instead of the summary
        #[arg(long)]
        json: bool,

        /// Write the JSON run result to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Parse and validate pricing.toml and sites.toml
    Validate,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  pricewatch-recon ",
        env!("CARGO_PKG_VERSION"),
        "\nlog env: PRICEWATCH_LOG",
    )
}

/// Log to stderr. `PRICEWATCH_LOG` takes an env-filter directive (default `info`);
/// records from the library crates' `log` calls are collected as well.
fn init_logging() {
    let filter = EnvFilter::try_from_env("PRICEWATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let project = Project::resolve(&cli.project);

    let result = match cli.command {
        Commands::Scrape => pipeline::cmd_scrape(&project),
        Commands::Analyze { scraped } => pipeline::cmd_analyze(&project, scraped),
        Commands::Recommend { comparison } => pipeline::cmd_recommend(&project, comparison),
        Commands::RunAll => pipeline::cmd_run_all(&project),
        Commands::Run { scraped, json, output } => {
            pipeline::cmd_run(&project, scraped, json, output)
        }
        Commands::Validate => pipeline::cmd_validate(&project),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
