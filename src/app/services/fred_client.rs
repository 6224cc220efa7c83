//! FRED API data source.
//!
//! Fetches series observations and descriptive metadata from the FRED
//! REST API. Values the feed marks as missing (".") are dropped rather
//! than carried forward as nulls; sorting is left to the transform
//! engine. Failures surface as per-series fetch errors for the
//! orchestrator to count, never as a process crash.

use crate::constants::{FRED_API_BASE, HTTP_TIMEOUT_SECS};
use crate::models::{Observation, SeriesInfo};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A source of series observations and metadata
///
/// Implemented by [`FredClient`] for the live API and by in-memory fakes
/// in orchestrator tests.
#[allow(async_fn_in_trait)]
pub trait SeriesSource {
    /// Fetch all observations for a series from `start_date` onward,
    /// together with the series' descriptive metadata
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
    ) -> Result<(Vec<Observation>, SeriesInfo)>;
}

/// Observations endpoint response
#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

/// One observation as FRED serializes it: both fields are strings,
/// with "." standing in for a missing value
#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// Series metadata endpoint response
#[derive(Debug, Deserialize)]
struct SeriesInfoResponse {
    seriess: Vec<RawSeriesInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSeriesInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    frequency_short: String,
    #[serde(default)]
    units: String,
    #[serde(default)]
    seasonal_adjustment_short: String,
}

impl From<RawSeriesInfo> for SeriesInfo {
    fn from(raw: RawSeriesInfo) -> Self {
        Self {
            title: raw.title,
            frequency: raw.frequency_short,
            units: raw.units,
            seasonal_adjustment: raw.seasonal_adjustment_short,
        }
    }
}

/// HTTP client for the FRED REST API
pub struct FredClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    /// Create a client with the default API endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: FRED_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (used against local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_observations(
        &self,
        series_id: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<Observation>> {
        let url = format!("{}/series/observations", self.base_url);
        let observation_start = start_date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("observation_start", observation_start.as_str()),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
            ])
            .send()
            .await
            .map_err(|e| Error::fetch(series_id, "observations request failed", Some(e)))?
            .error_for_status()
            .map_err(|e| Error::fetch(series_id, "observations request rejected", Some(e)))?;

        let body: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| Error::fetch(series_id, "observations decode failed", Some(e)))?;

        Ok(parse_observations(series_id, body.observations))
    }

    async fn fetch_info(&self, series_id: &str) -> Result<SeriesInfo> {
        let url = format!("{}/series", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
            ])
            .send()
            .await
            .map_err(|e| Error::fetch(series_id, "series info request failed", Some(e)))?
            .error_for_status()
            .map_err(|e| Error::fetch(series_id, "series info request rejected", Some(e)))?;

        let body: SeriesInfoResponse = response
            .json()
            .await
            .map_err(|e| Error::fetch(series_id, "series info decode failed", Some(e)))?;

        Ok(body
            .seriess
            .into_iter()
            .next()
            .map(SeriesInfo::from)
            .unwrap_or_default())
    }
}

impl SeriesSource for FredClient {
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
    ) -> Result<(Vec<Observation>, SeriesInfo)> {
        let observations = self.fetch_observations(series_id, start_date).await?;
        let info = self.fetch_info(series_id).await?;

        debug!(
            "Fetched {} observations for {} ({})",
            observations.len(),
            series_id,
            info.frequency
        );

        Ok((observations, info))
    }
}

/// Convert raw feed rows into observations, dropping missing values
///
/// FRED encodes absent values as "."; those rows and any row with an
/// unparseable date or value are skipped, not nulled.
fn parse_observations(series_id: &str, raw: Vec<RawObservation>) -> Vec<Observation> {
    let total = raw.len();
    let observations: Vec<Observation> = raw
        .into_iter()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").ok()?;
            let value: f64 = row.value.trim().parse().ok()?;
            Some(Observation {
                series_id: series_id.to_string(),
                date,
                value,
            })
        })
        .collect();

    if observations.len() < total {
        debug!(
            "Dropped {} missing or malformed observations for {}",
            total - observations.len(),
            series_id
        );
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, value: &str) -> RawObservation {
        RawObservation {
            date: date.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_observations_drops_missing_markers() {
        let rows = vec![
            raw("2020-01-01", "3.5"),
            raw("2020-02-01", "."),
            raw("2020-03-01", "4.4"),
        ];

        let observations = parse_observations("UNRATE", rows);
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].value, 3.5);
        assert_eq!(observations[1].date.to_string(), "2020-03-01");
        assert!(observations.iter().all(|o| o.series_id == "UNRATE"));
    }

    #[test]
    fn test_parse_observations_skips_malformed_rows() {
        let rows = vec![
            raw("not-a-date", "1.0"),
            raw("2020-01-01", "abc"),
            raw("2020-02-01", " 2.25 "),
        ];

        let observations = parse_observations("GDP", rows);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, 2.25);
    }

    #[test]
    fn test_series_info_defaults_when_response_is_empty() {
        let info = SeriesInfoResponse { seriess: vec![] }
            .seriess
            .into_iter()
            .next()
            .map(SeriesInfo::from)
            .unwrap_or_default();

        assert_eq!(info.title, "");
        assert_eq!(info.frequency, "");
    }

    #[test]
    fn test_raw_info_conversion() {
        let raw = RawSeriesInfo {
            title: "Unemployment Rate".to_string(),
            frequency_short: "M".to_string(),
            units: "Percent".to_string(),
            seasonal_adjustment_short: "SA".to_string(),
        };

        let info = SeriesInfo::from(raw);
        assert_eq!(info.frequency, "M");
        assert_eq!(info.seasonal_adjustment, "SA");
    }
}
