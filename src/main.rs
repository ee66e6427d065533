//! CLI entry point for the leaderboard rater.
//!
//! `percentiles` rewrites raw competition scores as leaderboard percentiles;
//! `aggregate` summarizes those percentiles per model, task type and language.

use anyhow::Result;
use clap::{Parser, Subcommand};
use leaderboard_rater::analyzers::analyzer::{AggregateOptions, run_aggregation};
use leaderboard_rater::layout::SheetLayout;
use leaderboard_rater::normalizer::convert_scores_to_percentiles;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "leaderboard_rater")]
#[command(about = "Rate competition scores against historical leaderboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace raw scores in the results workbook with leaderboard percentiles
    Percentiles {
        /// Results workbook (.xlsx)
        #[arg(value_name = "INPUT_XLSX")]
        input: PathBuf,

        /// Directory of leaderboard CSVs, one per competition
        #[arg(short, long, default_value = "leaderboards")]
        leaderboards: PathBuf,

        /// Workbook to write
        #[arg(short, long, default_value = "final_version_percentiles.xlsx")]
        output: PathBuf,

        /// Worksheet holding the scores
        #[arg(long, default_value = "SCORES")]
        sheet: String,

        /// JSON file overriding the column layout
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Summarize percentiles per model, task type and language
    Aggregate {
        /// Percentile workbook produced by `percentiles`
        #[arg(value_name = "INPUT_XLSX")]
        input: PathBuf,

        /// Directory for the median and IQR tables
        #[arg(short = 'd', long, default_value = "results_2")]
        output_dir: PathBuf,

        /// Worksheet to read (defaults to the first one)
        #[arg(long)]
        sheet: Option<String>,

        /// JSON file overriding the column layout
        #[arg(long)]
        layout: Option<PathBuf>,

        /// Also write every group statistic to this CSV
        #[arg(long)]
        stats_file: Option<PathBuf>,

        /// Treat percentiles as 1-100 and scale them to fractions first
        #[arg(long, default_value_t = false)]
        fraction: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/leaderboard_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("leaderboard_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Percentiles {
            input,
            leaderboards,
            output,
            sheet,
            layout,
        } => {
            let layout = SheetLayout::load_or_default(layout.as_deref())?;
            let report =
                convert_scores_to_percentiles(&input, &leaderboards, &output, &sheet, &layout)?;

            if !report.missing_competitions.is_empty() {
                warn!(
                    count = report.missing_competitions.len(),
                    "Some competitions had no leaderboard"
                );
            }
            info!(
                updated = report.updates_count(),
                output = %output.display(),
                "Done"
            );
        }
        Commands::Aggregate {
            input,
            output_dir,
            sheet,
            layout,
            stats_file,
            fraction,
        } => {
            let layout = SheetLayout::load_or_default(layout.as_deref())?;
            let options = AggregateOptions {
                sheet,
                output_dir,
                stats_file,
                fraction,
            };
            let outputs = run_aggregation(&input, &layout, &options)?;
            info!(groups = outputs.stats.len(), "Done");
        }
    }

    Ok(())
}
