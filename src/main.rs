//! CLI entry point for the violation report tool.
//!
//! Provides subcommands for producing one report variant from a violation
//! spreadsheet and for inspecting a dataset before analysis.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use violation_report::{
    config::{DEFAULT_INPUT, PipelineConfig, Variant},
    output::{print_json, print_pretty, write_records_csv},
    parser::load_dataset,
    pipeline::{normalize_plan, run},
    preprocess::normalize,
};

#[derive(Parser)]
#[command(name = "violation_report")]
#[command(about = "Statistics and charts for traffic violation records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce one report variant: CSV tables, PNG charts and a text summary
    Run {
        /// Report variant to produce [default: overview]
        #[arg(short, long, value_enum)]
        variant: Option<Variant>,

        /// Spreadsheet or CSV file with one violation per row [default: hakaton_nn_1month.xlsx]
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to the variant's own directory)
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// JSON file with run settings; command line flags override it
        #[arg(short, long)]
        config: Option<String>,

        /// Skip chart rendering
        #[arg(long, default_value_t = false)]
        no_charts: bool,

        /// Keep rows whose engine power is not a number
        #[arg(long, default_value_t = false)]
        keep_invalid_power: bool,

        /// Log the aggregate report as JSON when done
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load and normalize a dataset, then log its shape and missing values
    Inspect {
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Optional CSV file to write per-column missing counts to
        #[arg(long)]
        missing_csv: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct MissingCount {
    column: String,
    column_type: &'static str,
    missing: usize,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/violation_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("violation_report.log"));

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
        Commands::Run {
            variant,
            input,
            output_dir,
            config,
            no_charts,
            keep_invalid_power,
            json,
        } => {
            let mut settings = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::for_variant(variant.unwrap_or(Variant::Overview)),
            };
            if let Some(variant) = variant {
                settings.variant = variant;
            }
            if let Some(input) = input {
                settings.input = input;
            }
            if output_dir.is_some() {
                settings.output_dir = output_dir;
            }
            if no_charts {
                settings.render_charts = false;
            }
            if keep_invalid_power {
                settings.drop_invalid_engine_power = false;
            }

            let report = run(&settings)?;
            print_pretty(&report);
            if json {
                print_json(&report)?;
            }
            info!(
                variant = %settings.variant,
                reports = report.entries.len(),
                output_dir = %settings.output_dir().display(),
                "Run complete"
            );
        }
        Commands::Inspect { input, missing_csv } => {
            let mut dataset = load_dataset(&input)?;
            info!(
                rows = dataset.len(),
                columns = dataset.column_names().len(),
                "Dataset loaded"
            );

            // Keep every row so missing counts describe the whole file.
            let settings = PipelineConfig {
                drop_invalid_engine_power: false,
                ..PipelineConfig::default()
            };
            let summary = normalize(&mut dataset, &normalize_plan(&settings))?;
            for (column, coerced) in &summary.coerced_to_missing {
                if *coerced > 0 {
                    warn!(column = %column, coerced, "Values not readable as numbers");
                }
            }

            let counts: Vec<MissingCount> = dataset
                .schema()
                .into_iter()
                .zip(dataset.missing_counts())
                .map(|((column, column_type), (_, missing))| MissingCount {
                    column,
                    column_type,
                    missing,
                })
                .collect();
            for count in &counts {
                info!(
                    column = %count.column,
                    column_type = count.column_type,
                    missing = count.missing,
                    "Column"
                );
            }

            if let Some(path) = missing_csv {
                write_records_csv(&path, &counts)?;
                info!(path = %path.display(), "Missing counts written");
            }
        }
    }

    Ok(())
}
