use clap::Parser;
use fred_pipeline::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Set up graceful shutdown handling
        let shutdown_signal = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");

            // Cancel all operations when Ctrl+C is received
            cancellation_token.cancel();
        };

        // Run the main command with cancellation support
        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(fred_pipeline::Error::interrupted(
                    "Processing interrupted by user".to_string()
                ))
            }
        }
    });

    match result {
        Ok(()) => {
            // Success - the summary has already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("FRED Pipeline - Economic Indicator ETL");
    println!("======================================");
    println!();
    println!("Extract economic time series from the FRED API, compute derived metrics,");
    println!("and load PostgreSQL with CSV exports for dashboards and spreadsheets.");
    println!();
    println!("USAGE:");
    println!("    fred-pipeline <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run         Run the full ETL over the series catalog (main command)");
    println!("    export      Export dashboard CSV files from existing storage");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Run the full catalog with defaults:");
    println!("    fred-pipeline run");
    println!();
    println!("    # Run selected series with a custom window:");
    println!("    fred-pipeline run --series UNRATE,CPIAUCSL --start-date 2010-01-01");
    println!();
    println!("    # Export CSV files only:");
    println!("    fred-pipeline export --export-dir ./data");
    println!();
    println!("For detailed help on any command, use:");
    println!("    fred-pipeline <COMMAND> --help");
}
