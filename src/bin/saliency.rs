//! Saliency CLI - Command-line interface for gaze-saliency
//!
//! Commands:
//! - generate: Write fixation and saliency maps for a set of logs
//! - fixations: Print the detected fixations
//! - validate: Run the pre-flight checks without producing output
//! - config: Print the default configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use gaze_saliency::catalog::{clip_index_from_log_name, UNKNOWN_TITLE};
use gaze_saliency::{
    ClipTable, ErrorKind, Fixation, LogInput, SaliencyConfig, SaliencyError, SaliencyPipeline,
    TitleList, PRODUCER_NAME, VERSION,
};

/// Saliency - Fixation and saliency maps from 360° video viewing logs
#[derive(Parser)]
#[command(name = "saliency")]
#[command(version = VERSION)]
#[command(about = "Compute fixation and saliency maps from VR head and gaze logs", long_about = None)]
struct Cli {
    /// Emit debug-level logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that analyses logs
#[derive(clap::Args)]
struct RunArgs {
    /// Log files (all from the same clip)
    #[arg(required = true)]
    logs: Vec<PathBuf>,

    /// Clip metadata catalog (JSON)
    #[arg(long)]
    clips: PathBuf,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the window start (seconds)
    #[arg(long)]
    start: Option<f64>,

    /// Override the window length (seconds)
    #[arg(long)]
    seconds: Option<f64>,

    /// Treat the logs as gaze logs
    #[arg(long)]
    gaze: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write fixation and saliency maps for a set of logs
    Generate {
        #[command(flatten)]
        run: RunArgs,

        /// Clip titles, one per line in clip order
        #[arg(long)]
        titles: Option<PathBuf>,

        /// Directory the run directory is created in
        #[arg(short, long, default_value = "Outputs")]
        output_dir: PathBuf,
    },

    /// Print the detected fixations
    Fixations {
        #[command(flatten)]
        run: RunArgs,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Run the pre-flight checks without producing output
    Validate {
        #[command(flatten)]
        run: RunArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one fixation per line)
    Ndjson,
    /// JSON array of fixations
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), SaliencyCliError> {
    match cli.command {
        Commands::Generate {
            run,
            titles,
            output_dir,
        } => cmd_generate(&run, titles.as_deref(), &output_dir),

        Commands::Fixations { run, output_format } => cmd_fixations(&run, output_format),

        Commands::Validate { run, json } => cmd_validate(&run, json),

        Commands::Config => cmd_config(),
    }
}

fn load_inputs(args: &RunArgs) -> Result<(SaliencyConfig, ClipTable, Vec<LogInput>), SaliencyCliError> {
    let mut config = match &args.config {
        Some(path) => SaliencyConfig::load(path)?,
        None => SaliencyConfig::default(),
    };
    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(seconds) = args.seconds {
        config.seconds_to_consider = seconds;
    }
    if args.gaze {
        config.gaze_logs = true;
    }

    let catalog = ClipTable::load(&args.clips)?;
    let logs = args
        .logs
        .iter()
        .map(LogInput::read)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((config, catalog, logs))
}

fn cmd_generate(
    args: &RunArgs,
    titles: Option<&Path>,
    output_dir: &Path,
) -> Result<(), SaliencyCliError> {
    let (config, catalog, logs) = load_inputs(args)?;

    let title = match (titles, logs.first()) {
        (Some(path), Some(first)) => {
            let titles = TitleList::load(path)?;
            titles.title_for(clip_index_from_log_name(&first.name)?).to_string()
        }
        _ => UNKNOWN_TITLE.to_string(),
    };

    let pipeline = SaliencyPipeline::new(config, &catalog);
    let summary = pipeline.run(&logs, &title, output_dir, |_| ControlFlow::Continue(()))?;

    let report = GenerateReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        run_id: summary.run_id,
        output_dir: summary.output_dir.display().to_string(),
        title,
        frames_written: summary.frames_written,
        cancelled: summary.cancelled,
        fixations: summary.fixations,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn cmd_fixations(args: &RunArgs, output_format: OutputFormat) -> Result<(), SaliencyCliError> {
    let (config, catalog, logs) = load_inputs(args)?;
    let prepared = SaliencyPipeline::new(config, &catalog).prepare(&logs)?;

    let records: Vec<FixationRecord> = prepared
        .fixations()
        .iter()
        .map(|fixation| FixationRecord {
            log: prepared.series()[fixation.source_log_index].name().to_string(),
            fixation: *fixation,
        })
        .collect();

    match output_format {
        OutputFormat::Ndjson => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&records)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&records)?),
    }

    Ok(())
}

fn cmd_validate(args: &RunArgs, json: bool) -> Result<(), SaliencyCliError> {
    let (config, catalog, logs) = load_inputs(args)?;

    let prepared = match SaliencyPipeline::new(config, &catalog).prepare(&logs) {
        Ok(prepared) => prepared,
        Err(e) => {
            if !json {
                println!("Validation failed: {}", e);
            }
            return Err(e.into());
        }
    };

    let range = prepared.frame_range();
    let report = ValidationReport {
        clip_index: prepared.clip_index(),
        start_frame: range.start,
        end_frame: range.end,
        frames: range.len(),
        width: prepared.width(),
        height: prepared.height(),
        logs: prepared
            .series()
            .iter()
            .zip(prepared.thresholds())
            .enumerate()
            .map(|(idx, (series, threshold))| {
                let (first_timestamp, last_timestamp) = series.time_span().unwrap_or_default();
                LogReport {
                    name: series.name().to_string(),
                    samples: series.samples().len(),
                    first_timestamp,
                    last_timestamp,
                    threshold: threshold.threshold,
                    fixations: prepared
                        .fixations()
                        .iter()
                        .filter(|f| f.source_log_index == idx)
                        .count(),
                }
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Clip:        {}", report.clip_index);
        println!(
            "Frames:      {} to {} ({} frames)",
            report.start_frame, report.end_frame, report.frames
        );
        println!("Output size: {}x{}", report.width, report.height);
        println!("\nLogs:");
        for log in &report.logs {
            println!(
                "  - {} ({} samples, {} to {} s): threshold {}, {} fixations",
                log.name,
                log.samples,
                log.first_timestamp,
                log.last_timestamp,
                log.threshold
                    .map(|t| format!("{:.3} deg/s", t))
                    .unwrap_or_else(|| "n/a".to_string()),
                log.fixations
            );
        }
    }

    Ok(())
}

fn cmd_config() -> Result<(), SaliencyCliError> {
    println!("{}", SaliencyConfig::default().to_json_pretty()?);
    Ok(())
}

// Error types

#[derive(Debug)]
enum SaliencyCliError {
    Saliency(SaliencyError),
    Json(serde_json::Error),
}

impl From<SaliencyError> for SaliencyCliError {
    fn from(e: SaliencyError) -> Self {
        SaliencyCliError::Saliency(e)
    }
}

impl From<serde_json::Error> for SaliencyCliError {
    fn from(e: serde_json::Error) -> Self {
        SaliencyCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SaliencyCliError> for CliError {
    fn from(e: SaliencyCliError) -> Self {
        match e {
            SaliencyCliError::Saliency(e) => match e.kind() {
                ErrorKind::Parse => CliError {
                    code: "PARSE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some("Check the log, configuration and catalog files".to_string()),
                },
                ErrorKind::ConfigValidation => CliError {
                    code: "VALIDATION_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some("Adjust the time window or configuration and rerun".to_string()),
                },
                ErrorKind::Io => CliError {
                    code: "IO_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some("Check file paths and permissions".to_string()),
                },
            },
            SaliencyCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct GenerateReport {
    producer: String,
    version: String,
    run_id: String,
    output_dir: String,
    title: String,
    frames_written: u64,
    cancelled: bool,
    fixations: usize,
}

#[derive(serde::Serialize)]
struct FixationRecord {
    log: String,
    #[serde(flatten)]
    fixation: Fixation,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    clip_index: usize,
    start_frame: u64,
    end_frame: u64,
    frames: u64,
    width: u32,
    height: u32,
    logs: Vec<LogReport>,
}

#[derive(serde::Serialize)]
struct LogReport {
    name: String,
    samples: usize,
    first_timestamp: f64,
    last_timestamp: f64,
    threshold: Option<f64>,
    fixations: usize,
}
