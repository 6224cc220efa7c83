//! Command-line argument definitions for the FRED pipeline
//!
//! Defines the complete CLI interface using the clap derive API.

use crate::constants::{is_known_series, series_ids};
use crate::models::CatalogEntry;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the FRED economic indicator pipeline
///
/// Extracts economic time series from the FRED API, computes derived
/// metrics, loads PostgreSQL, and exports dashboard CSV files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fred-pipeline",
    version,
    about = "Extract FRED economic indicators, compute derived metrics, and load PostgreSQL",
    long_about = "A batch ETL tool that pulls a fixed catalog of economic time series from the \
                  FRED API, enriches each with percent changes, rolling averages, z-scores, and \
                  percentile ranks, upserts the results into PostgreSQL, and exports aggregate \
                  views to CSV for dashboards and spreadsheets."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the pipeline
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the full ETL over the series catalog, then export (main command)
    Run(RunArgs),
    /// Export dashboard CSV files from existing storage without fetching
    Export(ExportArgs),
}

/// Arguments for the run command (full ETL)
#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    /// Start of the historical window requested from FRED
    ///
    /// Defaults to 2000-01-01. Earlier dates pull more history on the
    /// first run; later dates shorten it.
    #[arg(
        long = "start-date",
        value_name = "DATE",
        help = "Start date for historical data (YYYY-MM-DD)"
    )]
    pub start_date: Option<String>,

    /// Courtesy delay between series in milliseconds
    ///
    /// Applied between successive API calls to stay under the FRED rate
    /// limit. Defaults to 500ms.
    #[arg(
        long = "delay-ms",
        value_name = "MS",
        help = "Pause between series in milliseconds"
    )]
    pub delay_ms: Option<u64>,

    /// Specific series to process (comma-separated list)
    ///
    /// If not specified, the full catalog is processed in its fixed
    /// order. Names must belong to the catalog.
    #[arg(
        short = 's',
        long = "series",
        value_name = "LIST",
        help = "Comma-separated list of catalog series to process"
    )]
    pub series: Option<SeriesList>,

    /// Skip the CSV export step after loading
    #[arg(long = "skip-export", help = "Load the database but skip CSV export")]
    pub skip_export: bool,

    /// Directory receiving CSV exports
    ///
    /// Defaults to the EXPORT_DIR environment variable, or ./data.
    #[arg(
        short = 'o',
        long = "export-dir",
        value_name = "PATH",
        help = "Directory for exported CSV files"
    )]
    pub export_dir: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors and critical messages. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the final run summary
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the run summary"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the export command (CSV export only)
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    /// Directory receiving CSV exports
    #[arg(
        short = 'o',
        long = "export-dir",
        value_name = "PATH",
        help = "Directory for exported CSV files"
    )]
    pub export_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

/// Output format options for the run summary
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
    /// CSV format for data analysis
    Csv,
}

/// Wrapper for parsing comma-separated series lists
#[derive(Debug, Clone)]
pub struct SeriesList {
    pub series: Vec<String>,
}

impl FromStr for SeriesList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let series: Vec<String> = s
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if series.is_empty() {
            return Err(Error::data_validation(
                "Series list cannot be empty".to_string(),
            ));
        }

        for series_id in &series {
            if !is_known_series(series_id) {
                return Err(Error::data_validation(format!(
                    "Unknown series '{}'. Available series: {}",
                    series_id,
                    series_ids().join(", ")
                )));
            }
        }

        Ok(SeriesList { series })
    }
}

impl RunArgs {
    /// Validate the run command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(start_date) = &self.start_date {
            crate::config::parse_start_date(start_date)?;
        }

        if let Some(delay_ms) = self.delay_ms {
            if delay_ms > 60_000 {
                return Err(Error::configuration(
                    "Courtesy delay cannot exceed 60000 ms".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Restrict the catalog to the requested series, keeping catalog order
    pub fn select_catalog(&self, catalog: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
        match &self.series {
            Some(list) => catalog
                .into_iter()
                .filter(|entry| list.series.contains(&entry.series_id))
                .collect(),
            None => catalog,
        }
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ExportArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
