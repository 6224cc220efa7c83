//! CSV export of aggregate dashboard views.
//!
//! Reads the `monthly_panel` and `current_snapshot` views back out of
//! storage and serializes each to a flat CSV file. Dates become
//! `YYYY-MM-DD` text and missing values become empty cells. Output files
//! are replaced wholesale on every export, never appended to.

use crate::constants::{PANEL_EXPORT_FILE, SNAPSHOT_EXPORT_FILE};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tracing::info;

/// One row of the long-format monthly panel view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PanelRow {
    pub month_date: NaiveDate,
    pub series_id: String,
    pub value: Option<f64>,
    pub yoy_change: Option<f64>,
}

/// One row of the current snapshot view: the latest value per series
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub series_id: String,
    pub title: String,
    pub category: String,
    pub units: String,
    pub as_of_date: NaiveDate,
    pub value: f64,
    pub mom_change: Option<f64>,
    pub yoy_change: Option<f64>,
    pub z_score: Option<f64>,
    pub percentile_rank: Option<f64>,
}

/// Row counts and file paths produced by an export run
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub panel_rows: usize,
    pub snapshot_rows: usize,
    pub files: Vec<PathBuf>,
}

/// Reads aggregate views and writes dashboard CSV files
pub struct Exporter {
    pool: PgPool,
    export_dir: PathBuf,
}

impl Exporter {
    pub fn new(pool: PgPool, export_dir: PathBuf) -> Self {
        Self { pool, export_dir }
    }

    /// Export both views, creating the output directory if needed
    pub async fn export_all(&self) -> Result<ExportSummary> {
        std::fs::create_dir_all(&self.export_dir).map_err(|e| {
            Error::io(
                format!(
                    "failed to create export directory '{}'",
                    self.export_dir.display()
                ),
                e,
            )
        })?;

        let panel = self.fetch_panel().await?;
        let panel_path = self.export_dir.join(PANEL_EXPORT_FILE);
        write_panel(&panel, &panel_path)?;
        info!("Exported {} panel rows to {}", panel.len(), panel_path.display());

        let snapshot = self.fetch_snapshot().await?;
        let snapshot_path = self.export_dir.join(SNAPSHOT_EXPORT_FILE);
        write_snapshot(&snapshot, &snapshot_path)?;
        info!(
            "Exported {} snapshot rows to {}",
            snapshot.len(),
            snapshot_path.display()
        );

        Ok(ExportSummary {
            panel_rows: panel.len(),
            snapshot_rows: snapshot.len(),
            files: vec![panel_path, snapshot_path],
        })
    }

    async fn fetch_panel(&self) -> Result<Vec<PanelRow>> {
        sqlx::query_as::<_, PanelRow>(
            "SELECT month_date, series_id, value, yoy_change
             FROM monthly_panel
             ORDER BY month_date, series_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::database("monthly panel query failed", e))
    }

    async fn fetch_snapshot(&self) -> Result<Vec<SnapshotRow>> {
        sqlx::query_as::<_, SnapshotRow>(
            "SELECT series_id, title, category, units, as_of_date, value,
                    mom_change, yoy_change, z_score, percentile_rank
             FROM current_snapshot
             ORDER BY category, title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::database("current snapshot query failed", e))
    }
}

/// Write the monthly panel CSV, replacing any existing file
fn write_panel(rows: &[PanelRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::export(format!("cannot open '{}'", path.display()), Some(e)))?;

    writer.write_record(["observation_date", "series_id", "value", "yoy_change"])?;
    for row in rows {
        writer.write_record([
            row.month_date.to_string(),
            row.series_id.clone(),
            cell(row.value),
            cell(row.yoy_change),
        ])?;
    }

    writer
        .flush()
        .map_err(|e| Error::io("failed to flush panel export", e))?;
    Ok(())
}

/// Write the current snapshot CSV, replacing any existing file
fn write_snapshot(rows: &[SnapshotRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::export(format!("cannot open '{}'", path.display()), Some(e)))?;

    writer.write_record([
        "series_id",
        "title",
        "category",
        "units",
        "as_of_date",
        "value",
        "mom_change",
        "yoy_change",
        "z_score",
        "percentile_rank",
    ])?;
    for row in rows {
        writer.write_record([
            row.series_id.clone(),
            row.title.clone(),
            row.category.clone(),
            row.units.clone(),
            row.as_of_date.to_string(),
            row.value.to_string(),
            cell(row.mom_change),
            cell(row.yoy_change),
            cell(row.z_score),
            cell(row.percentile_rank),
        ])?;
    }

    writer
        .flush()
        .map_err(|e| Error::io("failed to flush snapshot export", e))?;
    Ok(())
}

/// Render an optional metric as a CSV cell: missing values are empty
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn panel_row(month: u32, series_id: &str, value: Option<f64>) -> PanelRow {
        PanelRow {
            month_date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            series_id: series_id.to_string(),
            value,
            yoy_change: None,
        }
    }

    #[test]
    fn test_cell_formats_missing_as_empty() {
        assert_eq!(cell(Some(2.5)), "2.5");
        assert_eq!(cell(None), "");
    }

    #[test]
    fn test_write_panel_emits_header_and_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panel.csv");

        let rows = vec![
            panel_row(1, "UNRATE", Some(3.7)),
            panel_row(2, "UNRATE", None),
        ];
        write_panel(&rows, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "observation_date,series_id,value,yoy_change");
        assert_eq!(lines[1], "2024-01-01,UNRATE,3.7,");
        assert_eq!(lines[2], "2024-02-01,UNRATE,,");
    }

    #[test]
    fn test_write_panel_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panel.csv");

        write_panel(&vec![panel_row(1, "GDP", Some(1.0))], &path).unwrap();
        write_panel(&vec![panel_row(2, "GDP", Some(2.0))], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        // Second export fully replaces the first
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("2024-02-01"));
        assert!(!contents.contains("2024-01-01"));
    }

    #[test]
    fn test_write_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.csv");

        let rows = vec![SnapshotRow {
            series_id: "FEDFUNDS".to_string(),
            title: "Federal Funds Rate".to_string(),
            category: "Monetary Policy".to_string(),
            units: "Percent".to_string(),
            as_of_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            value: 5.33,
            mom_change: Some(0.0),
            yoy_change: None,
            z_score: Some(1.8),
            percentile_rank: Some(97.5),
        }];
        write_snapshot(&rows, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("series_id,title,category"));
        assert!(contents.contains("FEDFUNDS,Federal Funds Rate,Monetary Policy,Percent,2024-06-01,5.33,0,,1.8,97.5"));
    }
}
