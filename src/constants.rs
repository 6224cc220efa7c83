//! Application constants for the FRED indicator pipeline
//!
//! This module contains the fixed series catalog, API endpoints, default
//! values, and numeric parameters used throughout the application.

use crate::models::CatalogEntry;

// =============================================================================
// FRED API
// =============================================================================

/// Base URL for the FRED REST API
pub const FRED_API_BASE: &str = "https://api.stlouisfed.org/fred";

/// Default start of the historical window requested from FRED
pub const DEFAULT_START_DATE: &str = "2000-01-01";

/// HTTP request timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Pause between successive API calls to stay under the rate limit
pub const DEFAULT_COURTESY_DELAY_MS: u64 = 500;

// =============================================================================
// Series Catalog
// =============================================================================

/// Tracked economic indicators as (series_id, title, category)
///
/// The catalog is fixed at process start; ordering here is the processing
/// order of a pipeline run.
pub const SERIES_CATALOG: &[(&str, &str, &str)] = &[
    // Output & Growth
    ("GDP", "Gross Domestic Product", "Output & Growth"),
    ("INDPRO", "Industrial Production Index", "Output & Growth"),
    // Labor Market
    ("UNRATE", "Unemployment Rate", "Labor Market"),
    ("ICSA", "Initial Jobless Claims", "Labor Market"),
    ("PAYEMS", "Total Nonfarm Payrolls", "Labor Market"),
    // Inflation & Prices
    ("CPIAUCSL", "Consumer Price Index", "Inflation"),
    ("PCEPI", "PCE Price Index", "Inflation"),
    // Interest Rates & Monetary Policy
    ("FEDFUNDS", "Federal Funds Rate", "Monetary Policy"),
    ("T10Y2Y", "10Y-2Y Treasury Spread", "Monetary Policy"),
    ("DGS10", "10-Year Treasury Rate", "Monetary Policy"),
    // Consumer & Housing
    ("UMCSENT", "Consumer Sentiment Index", "Consumer"),
    ("RSXFS", "Retail Sales", "Consumer"),
    ("HOUST", "Housing Starts", "Housing"),
];

/// Build the ordered, immutable catalog passed to the orchestrator
pub fn series_catalog() -> Vec<CatalogEntry> {
    SERIES_CATALOG
        .iter()
        .map(|(id, title, category)| CatalogEntry::new(*id, *title, *category))
        .collect()
}

/// Check whether a series identifier is part of the catalog
pub fn is_known_series(series_id: &str) -> bool {
    SERIES_CATALOG.iter().any(|(id, _, _)| *id == series_id)
}

/// All catalog series identifiers in processing order
pub fn series_ids() -> Vec<&'static str> {
    SERIES_CATALOG.iter().map(|(id, _, _)| *id).collect()
}

// =============================================================================
// Derived Metric Parameters
// =============================================================================

/// Short trailing moving-average window (periods)
pub const ROLLING_SHORT_WINDOW: usize = 3;

/// Long trailing moving-average window (periods)
pub const ROLLING_LONG_WINDOW: usize = 12;

/// Year-over-year lag for series longer than the threshold
pub const YOY_LAG_LONG: usize = 12;

/// Year-over-year lag for short (effectively quarterly) series
pub const YOY_LAG_SHORT: usize = 4;

/// Series length above which the 12-period year-over-year lag applies
pub const YOY_LAG_THRESHOLD: usize = 12;

// =============================================================================
// Export
// =============================================================================

/// Default directory for CSV exports
pub const DEFAULT_EXPORT_DIR: &str = "data";

/// Filename for the long-format monthly panel export
pub const PANEL_EXPORT_FILE: &str = "dashboard_export.csv";

/// Filename for the current snapshot export
pub const SNAPSHOT_EXPORT_FILE: &str = "current_snapshot.csv";

/// Earliest month included in the monthly panel view
pub const EXPORT_CUTOFF_DATE: &str = "2015-01-01";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_thirteen_series() {
        assert_eq!(SERIES_CATALOG.len(), 13);
        assert_eq!(series_catalog().len(), 13);
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids = series_ids();
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }

    #[test]
    fn test_is_known_series() {
        assert!(is_known_series("UNRATE"));
        assert!(is_known_series("GDP"));
        assert!(!is_known_series("NOT-A-SERIES"));
    }

    #[test]
    fn test_catalog_order_is_stable() {
        let catalog = series_catalog();
        assert_eq!(catalog[0].series_id, "GDP");
        assert_eq!(catalog[12].series_id, "HOUST");
    }
}
