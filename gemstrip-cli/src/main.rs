//! gemstrip CLI - Command-line interface for strip-detector hit reconstruction.
//!
//! Reads raw strip record files, reconstructs 2D hits per detector and event,
//! and writes them as CSV or binary.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use gemstrip_core::{DiagnosticSink, MatchingStrategy, NullSink, SummarySink};
use gemstrip_io::{
    ClusterFileReader, HitFileWriter, HitFormat, RawFileReader, RunProcessor, RunSummary,
};
use gemstrip_readout::{EventWindow, RunConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    GemstripIo(#[from] gemstrip_io::Error),

    #[error("Configuration error: {0}")]
    Readout(#[from] gemstrip_readout::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Cross-plane matching strategy selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Exhaustive search over cluster orderings
    Permutation,
    /// Hungarian minimum-cost assignment
    Assignment,
    /// Permutation for small events, assignment for large ones
    Auto,
}

impl From<Strategy> for MatchingStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Permutation => MatchingStrategy::Permutation,
            Strategy::Assignment => MatchingStrategy::Assignment,
            Strategy::Auto => MatchingStrategy::Auto,
        }
    }
}

/// Strip-detector 2D hit reconstruction.
#[derive(Parser)]
#[command(name = "gemstrip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct 2D hits from raw strip record files
    Process {
        /// Input record file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output file path (.csv for CSV, anything else for binary)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Group records into time windows of this length (ns) instead of by event id
        #[arg(long)]
        window_ns: Option<f64>,

        /// Override the matching strategy
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Reconstruct the detectors of an event in parallel
        #[arg(long)]
        parallel: bool,

        /// Inputs hold pre-clustered X/Y records (needs --window-ns or a by_time window)
        #[arg(long)]
        clusters: bool,

        /// Print diagnostic summaries after the run
        #[arg(long)]
        stats: bool,
    },

    /// Show information about a raw record file
    Info {
        /// Input record file
        input: PathBuf,
    },

    /// Print a run configuration template
    Config {
        /// Write the template to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_config(
    path: Option<&Path>,
    window_ns: Option<f64>,
    strategy: Option<Strategy>,
    parallel: bool,
) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(duration) = window_ns {
        let window = EventWindow::ByTime { duration };
        window.validate()?;
        config.event_window = window;
    }
    if let Some(strategy) = strategy {
        config.matching.strategy = strategy.into();
    }
    if parallel {
        config.parallel_detectors = true;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.statistics;
    println!("Events: {}", stats.events);
    println!("Records: {}", summary.records);
    println!("Detector readouts: {}", stats.detector_readouts);
    println!(
        "  accepted: {} ({:.1}%)",
        stats.accepted,
        stats.acceptance_rate() * 100.0
    );
    println!("  no clusters: {}", stats.no_clusters);
    println!("  multiplicity rejected: {}", stats.multiplicity_rejected);
    println!("  unmatched: {}", stats.unmatched);
    println!("  non-physical: {}", stats.non_physical);
    println!("Clusters: {} x / {} y", stats.x_clusters, stats.y_clusters);
    println!("Hits written: {}", summary.hits_written);
    if summary.unmapped_records > 0 {
        println!("Unmapped records: {}", summary.unmapped_records);
    }
}

fn print_diagnostics(sink: &SummarySink) {
    println!(
        "{:<22} | {:>10} | {:>12} | {:>12} | {:>12}",
        "Observation", "Count", "Mean", "Min", "Max"
    );
    println!("{:-<80}", "");
    for (name, summary) in sink.iter() {
        let mean = summary.mean().unwrap_or(f64::NAN);
        println!(
            "{:<22} | {:>10} | {:>12.3} | {:>12.3} | {:>12.3}",
            name, summary.count, mean, summary.min, summary.max
        );
    }
    if sink.rejected() > 0 {
        println!("Non-finite observations dropped: {}", sink.rejected());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            window_ns,
            strategy,
            parallel,
            clusters,
            stats,
        } => {
            let config = load_config(config.as_deref(), window_ns, strategy, parallel)?;
            log::debug!("event window: {:?}", config.event_window);
            log::debug!(
                "acceptance: {}..={} clusters per plane, ratio window ({}, {}), strategy {:?}",
                config.clustering.acceptance.min_clusters_per_plane,
                config.clustering.acceptance.max_clusters_per_plane,
                config.matching.ratio_window.low,
                config.matching.ratio_window.high,
                config.matching.strategy
            );

            let run = RunProcessor::new(config)?;
            let format = HitFormat::from_path(&output);
            let mut writer = HitFileWriter::create(&output, format)?;
            log::info!("writing {:?} output to {}", format, output.display());

            let mut summary_sink = SummarySink::new();
            let mut null_sink = NullSink;
            let sink: &mut dyn DiagnosticSink = if stats {
                &mut summary_sink
            } else {
                &mut null_sink
            };

            let start = Instant::now();
            let mut total = RunSummary::default();
            for path in &input {
                log::info!("reading {}", path.display());
                let first_event = total.statistics.events;
                let summary = if clusters {
                    let reader = ClusterFileReader::open(path)?;
                    run.process_cluster_file(&reader, &mut writer, first_event, sink)?
                } else {
                    let reader = RawFileReader::open(path)?;
                    run.process_file(&reader, &mut writer, first_event, sink)?
                };
                total.merge(&summary);
            }
            let elapsed = start.elapsed();

            println!(
                "Processed {} files in {:.2}s",
                input.len(),
                elapsed.as_secs_f64()
            );
            print_summary(&total);
            if stats {
                println!();
                print_diagnostics(&summary_sink);
            }
        }

        Commands::Info { input } => {
            let reader = RawFileReader::open(&input)?;
            let file_size = reader.file_size();

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );
            println!("Records: {}", reader.record_count());

            let records = reader.read_all()?;
            let (Some(first), Some(last)) = (records.first(), records.last()) else {
                return Ok(());
            };

            let events = reader.events(EventWindow::ByEventId)?.count();
            println!("Events (by id): {}", events);
            println!("Event ids: {} - {}", first.event_id, last.event_id);

            let (min_ts, max_ts) = records.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), r| (lo.min(r.timestamp), hi.max(r.timestamp)),
            );
            println!("Timestamp range: {} - {} ns", min_ts, max_ts);

            let mut detectors: Vec<u8> = records.iter().map(|r| r.detector).collect();
            detectors.sort_unstable();
            detectors.dedup();
            let known = RunConfig::default().detectors;
            for id in detectors {
                let count = records.iter().filter(|r| r.detector == id).count();
                let name = known.name_of(id).unwrap_or("?");
                println!("Detector {} ({}): {} records", id, name, count);
            }
        }

        Commands::Config { output } => {
            let template = RunConfig::default().to_json_pretty()?;
            match output {
                Some(path) => {
                    if path.exists() {
                        return Err(CliError::InvalidArgument(format!(
                            "{} already exists",
                            path.display()
                        )));
                    }
                    std::fs::write(&path, template + "\n")?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", template),
            }
        }
    }

    Ok(())
}
