//! Configuration management and validation.
//!
//! Configuration is sourced from the environment (a `.env` file is honored
//! for local development), then overridden by CLI arguments. Missing
//! required values are a fatal startup error, reported before any series
//! is processed.

use crate::constants::{DEFAULT_COURTESY_DELAY_MS, DEFAULT_EXPORT_DIR, DEFAULT_START_DATE};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Environment variable carrying the FRED API credential
pub const ENV_FRED_API_KEY: &str = "FRED_API_KEY";

/// Environment variable carrying the PostgreSQL connection string
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable carrying the CSV export directory (optional)
pub const ENV_EXPORT_DIR: &str = "EXPORT_DIR";

/// Environment variable carrying the target spreadsheet identifier (optional)
pub const ENV_SPREADSHEET_ID: &str = "GOOGLE_SHEET_ID";

/// Runtime configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct Config {
    /// FRED API credential
    pub api_key: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Directory receiving CSV exports
    pub export_dir: PathBuf,

    /// External spreadsheet identifier, recorded for downstream tooling
    pub spreadsheet_id: Option<String>,

    /// Start of the historical window requested from FRED
    pub start_date: NaiveDate,

    /// Pause between successive series to respect API rate limits
    pub courtesy_delay: Duration,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Reads a `.env` file if one exists, then resolves required and
    /// optional variables. Fails with a configuration error when the
    /// API key or database URL is absent.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; variables may come from the shell
        let _ = dotenvy::dotenv();

        let api_key = std::env::var(ENV_FRED_API_KEY).map_err(|_| {
            Error::configuration(format!(
                "{} not found in environment variables",
                ENV_FRED_API_KEY
            ))
        })?;

        let database_url = std::env::var(ENV_DATABASE_URL).map_err(|_| {
            Error::configuration(format!(
                "{} not found in environment variables",
                ENV_DATABASE_URL
            ))
        })?;

        let export_dir = std::env::var(ENV_EXPORT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_EXPORT_DIR));

        let spreadsheet_id = std::env::var(ENV_SPREADSHEET_ID).ok();

        let start_date = parse_start_date(DEFAULT_START_DATE)?;

        let config = Self {
            api_key,
            database_url,
            export_dir,
            spreadsheet_id,
            start_date,
            courtesy_delay: Duration::from_millis(DEFAULT_COURTESY_DELAY_MS),
        };

        debug!(
            "Loaded configuration: start_date={}, export_dir={}",
            config.start_date,
            config.export_dir.display()
        );

        config.validate()?;
        Ok(config)
    }

    /// Override the start date
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Override the courtesy delay
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// Override the export directory
    pub fn with_export_dir(mut self, export_dir: PathBuf) -> Self {
        self.export_dir = export_dir;
        self
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration("FRED API key is empty"));
        }

        if self.database_url.trim().is_empty() {
            return Err(Error::configuration("database URL is empty"));
        }

        if let Some(sheet_id) = &self.spreadsheet_id {
            if sheet_id.trim().is_empty() {
                return Err(Error::configuration(
                    "spreadsheet identifier is set but empty",
                ));
            }
        }

        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` start date string
pub fn parse_start_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::configuration(format!("Invalid start date '{}': expected YYYY-MM-DD", s)))
}
