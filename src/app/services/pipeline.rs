//! Pipeline orchestration for the series catalog.
//!
//! Walks the fixed catalog strictly one series at a time:
//! fetch → transform → upsert metadata → upsert observations → upsert
//! metrics. Any failure for one series is logged and counted; the run
//! continues with the next entry after the courtesy delay. Only
//! cancellation aborts the whole run.

use crate::app::services::fred_client::SeriesSource;
use crate::app::services::store::SeriesStore;
use crate::app::services::transform::transform;
use crate::models::{CatalogEntry, PipelineStats, SeriesMetadata};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use indicatif::ProgressBar;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Sequential ETL runner over an ordered, immutable series catalog
pub struct Pipeline<S, T> {
    catalog: Vec<CatalogEntry>,
    source: S,
    store: T,
    start_date: NaiveDate,
    courtesy_delay: Duration,
}

impl<S: SeriesSource, T: SeriesStore> Pipeline<S, T> {
    pub fn new(
        catalog: Vec<CatalogEntry>,
        source: S,
        store: T,
        start_date: NaiveDate,
        courtesy_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            source,
            store,
            start_date,
            courtesy_delay,
        }
    }

    /// Number of catalog entries this run will attempt
    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    /// Run the full pipeline over the catalog
    ///
    /// Returns statistics on success. The only error paths are
    /// cancellation and an empty catalog; per-series failures are
    /// absorbed into the statistics.
    pub async fn run(
        &self,
        progress: Option<&ProgressBar>,
        cancel: &CancellationToken,
    ) -> Result<PipelineStats> {
        let start = Instant::now();
        let mut stats = PipelineStats::default();

        info!(
            "Starting pipeline run over {} series from {}",
            self.catalog.len(),
            self.start_date
        );

        for (i, entry) in self.catalog.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::interrupted("cancelled during pipeline run"));
            }

            if let Some(pb) = progress {
                pb.set_position(i as u64);
                pb.set_message(format!("{} ({})", entry.title, entry.series_id));
            }

            match self.process_series(entry).await {
                Ok(row_count) => {
                    stats.series_succeeded += 1;
                    stats.observations_processed += row_count;
                    info!("Loaded {} rows for {}", row_count, entry.series_id);
                }
                Err(e) => {
                    stats.series_failed += 1;
                    error!("Series {} failed: {}", entry.series_id, e);
                }
            }

            if i + 1 < self.catalog.len() {
                tokio::time::sleep(self.courtesy_delay).await;
            }
        }

        if let Some(pb) = progress {
            pb.set_position(self.catalog.len() as u64);
            pb.finish_with_message("Pipeline complete");
        }

        stats.elapsed = start.elapsed();
        info!(
            "Pipeline run finished: {}/{} series succeeded in {:.1}s",
            stats.series_succeeded,
            stats.series_attempted(),
            stats.elapsed.as_secs_f64()
        );

        Ok(stats)
    }

    /// Process one catalog entry end to end
    ///
    /// Returns the number of enriched rows written. An empty fetch or
    /// transform result is reported as an empty-series error so the
    /// caller can tally it as a per-series failure.
    async fn process_series(&self, entry: &CatalogEntry) -> Result<usize> {
        let (observations, info) = self
            .source
            .fetch_series(&entry.series_id, self.start_date)
            .await?;

        let enriched =
            transform(observations).ok_or_else(|| Error::empty_series(&entry.series_id))?;

        let metadata = SeriesMetadata::from_parts(entry, &info, Utc::now());
        self.store.upsert_metadata(&metadata).await?;
        self.store.upsert_observations(&enriched).await?;
        self.store.upsert_metrics(&enriched).await?;

        Ok(enriched.len())
    }
}
