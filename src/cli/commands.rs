//! Command implementations for the FRED pipeline CLI
//!
//! Contains command execution logic, logging setup, progress reporting,
//! and the final run summary in human, JSON, and CSV form.

use crate::app::services::export::{ExportSummary, Exporter};
use crate::app::services::fred_client::FredClient;
use crate::app::services::pipeline::Pipeline;
use crate::app::services::store::PgStore;
use crate::cli::args::{Args, Commands, ExportArgs, OutputFormat, RunArgs};
use crate::config::parse_start_date;
use crate::constants::series_catalog;
use crate::models::PipelineStats;
use crate::{Config, Error, Result};
use colored::Colorize;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Main command dispatcher
pub async fn run(args: Args, cancel: CancellationToken) -> Result<()> {
    match args.command {
        Some(Commands::Run(run_args)) => run_pipeline(run_args, cancel).await,
        Some(Commands::Export(export_args)) => run_export(export_args).await,
        None => Err(Error::configuration("no command specified")),
    }
}

/// Execute the full ETL: fetch, transform, load, then export
async fn run_pipeline(args: RunArgs, cancel: CancellationToken) -> Result<()> {
    setup_logging(args.get_log_level(), args.quiet)?;

    info!("Starting FRED pipeline");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let mut config = Config::from_env()?;
    if let Some(start_date) = &args.start_date {
        config = config.with_start_date(parse_start_date(start_date)?);
    }
    if let Some(delay_ms) = args.delay_ms {
        config = config.with_courtesy_delay(Duration::from_millis(delay_ms));
    }
    if let Some(export_dir) = &args.export_dir {
        config = config.with_export_dir(export_dir.clone());
    }

    let catalog = args.select_catalog(series_catalog());
    info!("Processing {} series from {}", catalog.len(), config.start_date);

    // Collaborator construction is fatal: no series has been attempted yet
    let store = PgStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;
    let pool = store.pool().clone();
    let client = FredClient::new(&config.api_key)?;

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new(catalog.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Initializing...");
        Some(pb)
    } else {
        None
    };

    let pipeline = Pipeline::new(
        catalog,
        client,
        store,
        config.start_date,
        config.courtesy_delay,
    );
    let stats = pipeline.run(progress_bar.as_ref(), &cancel).await?;

    let export_summary = if args.skip_export {
        info!("Skipping CSV export");
        None
    } else {
        let exporter = Exporter::new(pool, config.export_dir.clone());
        Some(exporter.export_all().await?)
    };

    generate_final_report(&args.output_format, &stats, export_summary.as_ref())
}

/// Export dashboard CSV files from existing storage
async fn run_export(args: ExportArgs) -> Result<()> {
    setup_logging(args.get_log_level(), false)?;

    info!("Starting export-only run");

    let mut config = Config::from_env()?;
    if let Some(export_dir) = &args.export_dir {
        config = config.with_export_dir(export_dir.clone());
    }

    let store = PgStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;

    let exporter = Exporter::new(store.pool().clone(), config.export_dir.clone());
    let summary = exporter.export_all().await?;

    println!(
        "\n{}",
        format!(
            "Export complete: {} panel rows, {} snapshot rows",
            summary.panel_rows, summary.snapshot_rows
        )
        .green()
    );
    for file in &summary.files {
        println!("   {}", file.display());
    }

    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fred_pipeline={}", log_level)));

    if quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Generate the final run report in the requested format
fn generate_final_report(
    format: &OutputFormat,
    stats: &PipelineStats,
    export: Option<&ExportSummary>,
) -> Result<()> {
    match format {
        OutputFormat::Human => generate_human_report(stats, export),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&render_json_report(stats, export))
                    .expect("report serialization cannot fail")
            );
            Ok(())
        }
        OutputFormat::Csv => generate_csv_report(stats),
    }
}

/// Generate human-readable report
fn generate_human_report(stats: &PipelineStats, export: Option<&ExportSummary>) -> Result<()> {
    let duration = HumanDuration(stats.elapsed);

    println!("\n{}", "FRED Pipeline Complete".green().bold());
    println!("{}", "=".repeat(40));
    println!(
        "   Series succeeded: {}/{}",
        stats.series_succeeded,
        stats.series_attempted()
    );
    if stats.series_failed > 0 {
        println!(
            "   {}",
            format!(
                "Series failed: {}/{}",
                stats.series_failed,
                stats.series_attempted()
            )
            .yellow()
        );
    }
    println!("   Observations loaded: {}", stats.observations_processed);
    println!("   Duration: {}", duration);

    if let Some(summary) = export {
        println!("\n   Exported files:");
        for file in &summary.files {
            println!("      {}", file.display());
        }
    }

    println!();
    Ok(())
}

/// Build the JSON report body
fn render_json_report(stats: &PipelineStats, export: Option<&ExportSummary>) -> serde_json::Value {
    serde_json::json!({
        "series_succeeded": stats.series_succeeded,
        "series_failed": stats.series_failed,
        "series_attempted": stats.series_attempted(),
        "observations_processed": stats.observations_processed,
        "duration_seconds": stats.elapsed.as_secs_f64(),
        "export": export.map(|summary| serde_json::json!({
            "panel_rows": summary.panel_rows,
            "snapshot_rows": summary.snapshot_rows,
            "files": summary.files.iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>(),
        })),
    })
}

/// Generate CSV report for data analysis
fn generate_csv_report(stats: &PipelineStats) -> Result<()> {
    println!("metric,value");
    println!("series_succeeded,{}", stats.series_succeeded);
    println!("series_failed,{}", stats.series_failed);
    println!("observations_processed,{}", stats.observations_processed);
    println!("duration_seconds,{}", stats.elapsed.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> PipelineStats {
        PipelineStats {
            series_succeeded: 12,
            series_failed: 1,
            observations_processed: 4_200,
            elapsed: Duration::from_secs(14),
        }
    }

    #[test]
    fn test_json_report_shape() {
        let report = render_json_report(&stats(), None);

        assert_eq!(report["series_succeeded"], 12);
        assert_eq!(report["series_failed"], 1);
        assert_eq!(report["series_attempted"], 13);
        assert_eq!(report["observations_processed"], 4_200);
        assert!(report["export"].is_null());
    }

    #[test]
    fn test_json_report_includes_export_summary() {
        let summary = ExportSummary {
            panel_rows: 120,
            snapshot_rows: 13,
            files: vec!["data/dashboard_export.csv".into()],
        };

        let report = render_json_report(&stats(), Some(&summary));
        assert_eq!(report["export"]["panel_rows"], 120);
        assert_eq!(report["export"]["files"][0], "data/dashboard_export.csv");
    }

    #[test]
    fn test_human_and_csv_reports_do_not_fail() {
        assert!(generate_human_report(&stats(), None).is_ok());
        assert!(generate_csv_report(&stats()).is_ok());
    }
}
