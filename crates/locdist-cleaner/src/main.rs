//! CLI entry point for the location-distance cleaner.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use locdist_cleaner::config::{DEFAULT_DATASET_COUNT, DEFAULT_FILE_PREFIX};
use locdist_cleaner::{BatchReport, CleaningConfig, CleaningPipeline, DatasetOutcome};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean location-distance exports",
    long_about = "Cleans a batch of numbered location-distance CSV exports and prints \
                  the remaining missing values per column for each file.\n\n\
                  EXAMPLES:\n  \
                  # Clean Locationdistance_eb2prod_1.csv .. _7.csv in /data\n  \
                  locdist-cleaner /data\n\n  \
                  # Interpolate per user, write cleaned CSVs, fail on any error\n  \
                  locdist-cleaner /data --group-by-user --export-dir /data/clean --strict\n\n  \
                  # Machine-readable report\n  \
                  locdist-cleaner /data --json | jq .failed"
)]
struct Args {
    /// Directory holding the numbered CSV files
    ///
    /// Prompted for on stdin when omitted
    base_dir: Option<PathBuf>,

    /// File name prefix; dataset i is read from <prefix><i>.csv
    #[arg(long, default_value = DEFAULT_FILE_PREFIX)]
    prefix: String,

    /// Number of datasets, numbered from 1
    #[arg(long, default_value_t = DEFAULT_DATASET_COUNT)]
    count: usize,

    /// Interpolate within each user's stream instead of across the whole table
    #[arg(long)]
    group_by_user: bool,

    /// Clean datasets concurrently
    #[arg(long)]
    parallel: bool,

    /// Write each cleaned dataset as <name>_clean.csv into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the text report
    ///
    /// Disables all logs; only the batch report is written.
    #[arg(long)]
    json: bool,

    /// Also write the JSON batch report to this file
    #[arg(short = 'r', long)]
    emit_report: Option<PathBuf>,

    /// Exit with a non-zero status if any dataset failed
    #[arg(long)]
    strict: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// With `--json` no subscriber is installed so stdout holds only the report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => prompt_base_dir()?,
    };
    if !base_dir.is_dir() {
        warn!("Base path is not a directory: {}", base_dir.display());
    }

    let mut config_builder = CleaningConfig::builder()
        .base_dir(&base_dir)
        .file_prefix(&args.prefix)
        .dataset_count(args.count)
        .group_by_user(args.group_by_user)
        .parallel(args.parallel);

    if let Some(ref dir) = args.export_dir {
        config_builder = config_builder.export_dir(dir);
    }

    let config = config_builder.build()?;
    let report = CleaningPipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.dataset,
                update.stage.display_name()
            );
        })
        .build()?
        .run_batch();

    if let Some(ref path) = args.emit_report {
        report
            .write_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_human_readable_summary(&report, &base_dir);
    }

    if args.strict && report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Ask for the base directory on stdin.
fn prompt_base_dir() -> Result<PathBuf> {
    eprint!("Enter the base path: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read base path from stdin")?;

    let path = line.trim();
    if path.is_empty() {
        return Err(anyhow!("No base path given"));
    }
    info!("Using base path: {}", path);
    Ok(PathBuf::from(path))
}

/// Print the batch report for humans.
///
/// Uses `println!` on purpose: this is the program's output, not a log.
fn print_human_readable_summary(report: &BatchReport, base_dir: &std::path::Path) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE: {}", base_dir.display());
    println!("{}", "=".repeat(80));
    println!();
    println!("Missing values after cleaning:");
    println!();
    println!("{}", report);

    let failed: Vec<&DatasetOutcome> = report.datasets.iter().filter(|o| o.is_failed()).collect();
    if !failed.is_empty() {
        println!();
        println!("Failed datasets:");
        for outcome in failed {
            if let Some(line) = outcome.diagnostic() {
                println!("  - {}", line);
            }
        }
    }
    println!();
}
