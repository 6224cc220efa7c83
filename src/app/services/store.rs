//! PostgreSQL persistence gateway.
//!
//! Three idempotent upsert operations back the pipeline: series metadata
//! keyed by series_id, raw observations and calculated metrics keyed by
//! (series_id, observation_date). Repeated writes with the same key
//! overwrite prior values — last write wins, no history. Batch upserts
//! bind whole columns through UNNEST instead of issuing one statement
//! per row.

use crate::models::{EnrichedObservation, SeriesMetadata};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

/// Destination for metadata and enriched observation rows
///
/// Implemented by [`PgStore`] for PostgreSQL and by in-memory fakes in
/// orchestrator tests.
#[allow(async_fn_in_trait)]
pub trait SeriesStore {
    /// Insert or overwrite the metadata row for a series
    async fn upsert_metadata(&self, metadata: &SeriesMetadata) -> Result<()>;

    /// Insert or overwrite raw (series_id, date, value) rows
    async fn upsert_observations(&self, rows: &[EnrichedObservation]) -> Result<()>;

    /// Insert or overwrite enriched metric rows
    async fn upsert_metrics(&self, rows: &[EnrichedObservation]) -> Result<()>;
}

/// Statements provisioning tables and read-only views at startup
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS series_metadata (
        series_id           TEXT PRIMARY KEY,
        title               TEXT NOT NULL,
        category            TEXT NOT NULL,
        frequency           TEXT NOT NULL DEFAULT '',
        units               TEXT NOT NULL DEFAULT '',
        seasonal_adjustment TEXT NOT NULL DEFAULT '',
        last_updated        TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS observations (
        series_id        TEXT NOT NULL,
        observation_date DATE NOT NULL,
        value            DOUBLE PRECISION NOT NULL,
        PRIMARY KEY (series_id, observation_date)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS calculated_metrics (
        series_id        TEXT NOT NULL,
        observation_date DATE NOT NULL,
        value            DOUBLE PRECISION NOT NULL,
        mom_change       DOUBLE PRECISION,
        yoy_change       DOUBLE PRECISION,
        rolling_avg_3m   DOUBLE PRECISION,
        rolling_avg_12m  DOUBLE PRECISION,
        z_score          DOUBLE PRECISION,
        percentile_rank  DOUBLE PRECISION,
        PRIMARY KEY (series_id, observation_date)
    )"#,
    r#"CREATE OR REPLACE VIEW monthly_panel AS
        SELECT
            date_trunc('month', observation_date)::date AS month_date,
            series_id,
            AVG(value)      AS value,
            AVG(yoy_change) AS yoy_change
        FROM calculated_metrics
        WHERE observation_date >= '2015-01-01'
        GROUP BY date_trunc('month', observation_date), series_id"#,
    r#"CREATE OR REPLACE VIEW current_snapshot AS
        SELECT DISTINCT ON (cm.series_id)
            cm.series_id,
            sm.title,
            sm.category,
            sm.units,
            cm.observation_date AS as_of_date,
            cm.value,
            cm.mom_change,
            cm.yoy_change,
            cm.z_score,
            cm.percentile_rank
        FROM calculated_metrics cm
        JOIN series_metadata sm USING (series_id)
        ORDER BY cm.series_id, cm.observation_date DESC"#,
];

/// PostgreSQL-backed series store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database with a small connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| Error::database("failed to connect to database", e))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (shared with the export stage)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and views if they do not exist yet
    ///
    /// Failure here is fatal at startup, not a per-series error.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::database("schema provisioning failed", e))?;
        }

        info!("Database schema verified");
        Ok(())
    }
}

/// Split enriched rows into parallel column vectors for array binding
struct MetricColumns {
    series_ids: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    mom_change: Vec<Option<f64>>,
    yoy_change: Vec<Option<f64>>,
    rolling_avg_3m: Vec<Option<f64>>,
    rolling_avg_12m: Vec<Option<f64>>,
    z_score: Vec<Option<f64>>,
    percentile_rank: Vec<Option<f64>>,
}

impl MetricColumns {
    fn from_rows(rows: &[EnrichedObservation]) -> Self {
        Self {
            series_ids: rows.iter().map(|r| r.series_id.clone()).collect(),
            dates: rows.iter().map(|r| r.date).collect(),
            values: rows.iter().map(|r| r.value).collect(),
            mom_change: rows.iter().map(|r| r.mom_change).collect(),
            yoy_change: rows.iter().map(|r| r.yoy_change).collect(),
            rolling_avg_3m: rows.iter().map(|r| r.rolling_avg_3m).collect(),
            rolling_avg_12m: rows.iter().map(|r| r.rolling_avg_12m).collect(),
            z_score: rows.iter().map(|r| r.z_score).collect(),
            percentile_rank: rows.iter().map(|r| r.percentile_rank).collect(),
        }
    }
}

impl SeriesStore for PgStore {
    async fn upsert_metadata(&self, metadata: &SeriesMetadata) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO series_metadata
                   (series_id, title, category, frequency, units, seasonal_adjustment, last_updated)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (series_id) DO UPDATE SET
                   title = EXCLUDED.title,
                   category = EXCLUDED.category,
                   frequency = EXCLUDED.frequency,
                   units = EXCLUDED.units,
                   seasonal_adjustment = EXCLUDED.seasonal_adjustment,
                   last_updated = EXCLUDED.last_updated"#,
        )
        .bind(&metadata.series_id)
        .bind(&metadata.title)
        .bind(&metadata.category)
        .bind(&metadata.frequency)
        .bind(&metadata.units)
        .bind(&metadata.seasonal_adjustment)
        .bind(metadata.last_updated)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database("metadata upsert failed", e))?;

        debug!("Upserted metadata for {}", metadata.series_id);
        Ok(())
    }

    async fn upsert_observations(&self, rows: &[EnrichedObservation]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let columns = MetricColumns::from_rows(rows);

        sqlx::query(
            r#"INSERT INTO observations (series_id, observation_date, value)
               SELECT * FROM UNNEST($1::text[], $2::date[], $3::float8[])
               ON CONFLICT (series_id, observation_date) DO UPDATE SET
                   value = EXCLUDED.value"#,
        )
        .bind(&columns.series_ids)
        .bind(&columns.dates)
        .bind(&columns.values)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database("observation upsert failed", e))?;

        debug!("Upserted {} observation rows", rows.len());
        Ok(())
    }

    async fn upsert_metrics(&self, rows: &[EnrichedObservation]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let columns = MetricColumns::from_rows(rows);

        sqlx::query(
            r#"INSERT INTO calculated_metrics
                   (series_id, observation_date, value, mom_change, yoy_change,
                    rolling_avg_3m, rolling_avg_12m, z_score, percentile_rank)
               SELECT * FROM UNNEST(
                   $1::text[], $2::date[], $3::float8[], $4::float8[], $5::float8[],
                   $6::float8[], $7::float8[], $8::float8[], $9::float8[])
               ON CONFLICT (series_id, observation_date) DO UPDATE SET
                   value = EXCLUDED.value,
                   mom_change = EXCLUDED.mom_change,
                   yoy_change = EXCLUDED.yoy_change,
                   rolling_avg_3m = EXCLUDED.rolling_avg_3m,
                   rolling_avg_12m = EXCLUDED.rolling_avg_12m,
                   z_score = EXCLUDED.z_score,
                   percentile_rank = EXCLUDED.percentile_rank"#,
        )
        .bind(&columns.series_ids)
        .bind(&columns.dates)
        .bind(&columns.values)
        .bind(&columns.mom_change)
        .bind(&columns.yoy_change)
        .bind(&columns.rolling_avg_3m)
        .bind(&columns.rolling_avg_12m)
        .bind(&columns.z_score)
        .bind(&columns.percentile_rank)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database("metrics upsert failed", e))?;

        debug!("Upserted {} metric rows", rows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn enriched(series_id: &str, day: u32, value: f64) -> EnrichedObservation {
        EnrichedObservation {
            series_id: series_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            value,
            mom_change: Some(1.0),
            yoy_change: None,
            rolling_avg_3m: Some(value),
            rolling_avg_12m: Some(value),
            z_score: Some(0.0),
            percentile_rank: Some(50.0),
        }
    }

    #[test]
    fn test_metric_columns_preserve_order_and_nulls() {
        let rows = vec![enriched("GDP", 1, 10.0), enriched("GDP", 2, 20.0)];
        let columns = MetricColumns::from_rows(&rows);

        assert_eq!(columns.series_ids, vec!["GDP", "GDP"]);
        assert_eq!(columns.values, vec![10.0, 20.0]);
        assert_eq!(columns.yoy_change, vec![None, None]);
        assert_eq!(columns.mom_change, vec![Some(1.0), Some(1.0)]);
        assert_eq!(columns.dates[1].to_string(), "2024-01-02");
    }

    #[test]
    fn test_schema_statements_cover_tables_and_views() {
        assert_eq!(SCHEMA_STATEMENTS.len(), 5);
        assert!(SCHEMA_STATEMENTS[0].contains("series_metadata"));
        assert!(SCHEMA_STATEMENTS[3].contains("monthly_panel"));
        assert!(SCHEMA_STATEMENTS[4].contains("current_snapshot"));
    }
}
