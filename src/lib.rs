//! FRED Indicator Pipeline Library
//!
//! A Rust library for extracting economic time series from the FRED API,
//! enriching them with derived analytical metrics, and loading the results
//! into PostgreSQL for reporting and spreadsheet export.
//!
//! This library provides tools for:
//! - Fetching series observations and metadata from the FRED REST API
//! - Computing derived metrics (percent changes, rolling averages, z-scores,
//!   percentile ranks) over each series independently
//! - Idempotent batch upserts of metadata, raw observations, and metrics
//! - CSV export of aggregate dashboard views
//! - Per-series failure isolation with end-of-run statistics

pub mod config;
pub mod constants;
pub mod models;

// Core application modules
pub mod app {
    pub mod services {
        pub mod export;
        pub mod fred_client;
        pub mod pipeline;
        pub mod store;
        pub mod transform;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::Config;
pub use models::{CatalogEntry, EnrichedObservation, Observation, PipelineStats, SeriesMetadata};

/// Result type alias for the FRED pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pipeline operations
///
/// Configuration and store-construction errors are fatal at startup.
/// Fetch, empty-series, and database errors during a run are recoverable
/// per series: the orchestrator logs and counts them, then moves on.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// FRED API request or decode failure
    #[error("Fetch error for series '{series_id}': {message}")]
    Fetch {
        series_id: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Database operation failed
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// A series produced no observations to persist
    #[error("Series '{series_id}' returned no observations")]
    EmptySeries { series_id: String },

    /// CSV export failure
    #[error("Export error: {message}")]
    Export {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Date parsing error
    #[error("Date parsing error: {message}")]
    DateParsing {
        message: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Input validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// Run interrupted before completion
    #[error("Pipeline interrupted: {reason}")]
    Interrupted { reason: String },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a fetch error with context
    pub fn fetch(
        series_id: impl Into<String>,
        message: impl Into<String>,
        source: Option<reqwest::Error>,
    ) -> Self {
        Self::Fetch {
            series_id: series_id.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a database error with context
    pub fn database(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Create an empty-series marker
    pub fn empty_series(series_id: impl Into<String>) -> Self {
        Self::EmptySeries {
            series_id: series_id.into(),
        }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>, source: Option<csv::Error>) -> Self {
        Self::Export {
            message: message.into(),
            source,
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create an interrupted error
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            message: "database operation failed".to_string(),
            source: error,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Fetch {
            series_id: "unknown".to_string(),
            message: "HTTP request failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Export {
            message: "CSV serialization failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateParsing {
            message: "date parsing failed".to_string(),
            source: error,
        }
    }
}
