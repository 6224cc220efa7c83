//! Core data structures for the FRED indicator pipeline.
//!
//! Defines observations, series metadata, enriched metric rows,
//! catalog entries, and run statistics used throughout the library.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single raw data point within a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub series_id: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Descriptive metadata returned by the FRED series endpoint
///
/// Fields default to empty strings when the API response omits them;
/// the catalog title takes precedence over the API title for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub title: String,
    pub frequency: String,
    pub units: String,
    pub seasonal_adjustment: String,
}

/// One metadata row per series, overwritten on each refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub series_id: String,
    pub title: String,
    pub category: String,
    pub frequency: String,
    pub units: String,
    pub seasonal_adjustment: String,
    pub last_updated: DateTime<Utc>,
}

impl SeriesMetadata {
    /// Combine a catalog entry with fetched series info into a storable row
    pub fn from_parts(entry: &CatalogEntry, info: &SeriesInfo, last_updated: DateTime<Utc>) -> Self {
        Self {
            series_id: entry.series_id.clone(),
            title: entry.title.clone(),
            category: entry.category.clone(),
            frequency: info.frequency.clone(),
            units: info.units.clone(),
            seasonal_adjustment: info.seasonal_adjustment.clone(),
            last_updated,
        }
    }
}

/// An observation extended with the six derived metric columns
///
/// Derived fields are `None` when undefined for the row position
/// (leading rows for change metrics) or when the computation produced
/// a non-finite result that cannot be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedObservation {
    pub series_id: String,
    pub date: NaiveDate,
    pub value: f64,
    pub mom_change: Option<f64>,
    pub yoy_change: Option<f64>,
    pub rolling_avg_3m: Option<f64>,
    pub rolling_avg_12m: Option<f64>,
    pub z_score: Option<f64>,
    pub percentile_rank: Option<f64>,
}

/// One entry in the fixed series catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub series_id: String,
    pub title: String,
    pub category: String,
}

impl CatalogEntry {
    pub fn new(
        series_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            title: title.into(),
            category: category.into(),
        }
    }
}

/// Statistics for a complete pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Number of series processed end to end
    pub series_succeeded: usize,

    /// Number of series that failed fetch, transform, or load
    pub series_failed: usize,

    /// Total enriched observations written across all series
    pub observations_processed: usize,

    /// Total wall-clock run time
    pub elapsed: std::time::Duration,
}

impl PipelineStats {
    /// Total number of series attempted
    pub fn series_attempted(&self) -> usize {
        self.series_succeeded + self.series_failed
    }

    /// Success rate as a percentage of attempted series
    pub fn success_rate(&self) -> f64 {
        if self.series_attempted() == 0 {
            0.0
        } else {
            (self.series_succeeded as f64 / self.series_attempted() as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stats_success_rate() {
        let stats = PipelineStats::default();
        assert_eq!(stats.success_rate(), 0.0);

        let stats = PipelineStats {
            series_succeeded: 3,
            series_failed: 1,
            ..Default::default()
        };
        assert_eq!(stats.series_attempted(), 4);
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_series_metadata_from_parts() {
        let entry = CatalogEntry::new("UNRATE", "Unemployment Rate", "Labor Market");
        let info = SeriesInfo {
            title: "Unemployment Rate".to_string(),
            frequency: "M".to_string(),
            units: "Percent".to_string(),
            seasonal_adjustment: "SA".to_string(),
        };

        let now = Utc::now();
        let metadata = SeriesMetadata::from_parts(&entry, &info, now);

        assert_eq!(metadata.series_id, "UNRATE");
        assert_eq!(metadata.category, "Labor Market");
        assert_eq!(metadata.frequency, "M");
        assert_eq!(metadata.last_updated, now);
    }
}
