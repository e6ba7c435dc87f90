//! # CLI Module
//!
//! Command-line interface for running persisted pipelines.
//!
//! ## Usage
//! ```bash
//! # Run a pipeline file
//! imagepipe run pipeline.json
//!
//! # Spread items across cores and keep going past bad files
//! imagepipe run pipeline.json --parallel --skip-failures
//!
//! # Show the layer table
//! imagepipe summary pipeline.json
//!
//! # Re-check the composition rules layer by layer
//! imagepipe validate pipeline.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use imagepipe::core::pipeline::{Executor, ExecutorConfig, FailurePolicy, Pipeline, RunReport};
use imagepipe::core::snapshot::PipelineSnapshot;
use imagepipe::error::{Result, SnapshotError};
use imagepipe::events::{Event, EventChannel, RunEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// imagepipe - declarative image preprocessing and augmentation
#[derive(Parser, Debug)]
#[command(name = "imagepipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a persisted pipeline over its source directory
    Run {
        /// Pipeline file written by `Pipeline::persist`
        pipeline: PathBuf,

        /// Process several images at once
        #[arg(long)]
        parallel: bool,

        /// Record failing images and continue instead of stopping
        #[arg(long)]
        skip_failures: bool,

        /// No progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Print the layer table of a pipeline
    Summary {
        /// Pipeline file
        pipeline: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Check a pipeline file against the composition rules
    Validate {
        /// Pipeline file
        pipeline: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            parallel,
            skip_failures,
            quiet,
            output,
        } => run_pipeline(&pipeline, parallel, skip_failures, quiet, output),
        Commands::Summary { pipeline, output } => print_summary(&pipeline, output),
        Commands::Validate { pipeline } => validate(&pipeline),
    }
}

fn run_pipeline(
    path: &Path,
    parallel: bool,
    skip_failures: bool,
    quiet: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("imagepipe").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = Pipeline::load(path)?;

    let policy = if skip_failures {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };
    let executor = Executor::new(ExecutorConfig::new().parallel(parallel).on_failure(policy));

    let (sender, receiver) = EventChannel::new();

    let progress = if pretty && !quiet {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Run(RunEvent::Started { total_items }) => {
                    pb.set_length(total_items as u64);
                }
                Event::Run(RunEvent::ItemCompleted(p)) => {
                    pb.set_position(p.completed as u64);
                    pb.set_message(p.identifier);
                }
                Event::Run(RunEvent::ItemFailed {
                    identifier,
                    completed,
                    ..
                }) => {
                    pb.set_position(completed as u64);
                    pb.set_message(format!("failed: {}", identifier));
                }
                Event::Run(RunEvent::Completed { .. }) | Event::Run(RunEvent::Aborted { .. }) => {
                    pb.finish_and_clear();
                }
            }
        }
    });

    let result = executor.run_with_events(&pipeline, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;
    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => print_json(&report),
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &RunReport) {
    term.write_line(&format!("{} Run Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} of {} items processed in {:.1}s",
        style(report.processed_items).cyan(),
        report.total_items,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} images produced",
        style(report.images_out).cyan()
    ))
    .ok();

    if !report.failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style(format!("Skipped {} items:", report.failures.len()))
                .yellow()
                .bold()
        ))
        .ok();
        for failure in &report.failures {
            term.write_line(&format!(
                "  {} {}: {}",
                style("○").dim(),
                failure.identifier,
                style(&failure.message).dim()
            ))
            .ok();
        }
    }
}

fn print_summary(path: &Path, output: OutputFormat) -> Result<()> {
    let pipeline = Pipeline::load(path)?;

    match output {
        OutputFormat::Pretty => {
            print!("{}", pipeline.summary_table());
            if pipeline.is_frozen() {
                println!("{}", style("frozen").dim());
            }
        }
        OutputFormat::Json => print_json(&pipeline.summary()),
    }

    Ok(())
}

/// Rebuild the file's layers and add them one by one to an empty pipeline
fn validate(path: &Path) -> Result<()> {
    let term = Term::stderr();

    let json = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: PipelineSnapshot = serde_json::from_str(&json).map_err(SnapshotError::from)?;
    snapshot.check_version()?;

    let mut rebuilt = Pipeline::new();
    for (index, spec) in snapshot.layers.into_iter().enumerate() {
        let layer = spec.build().map_err(SnapshotError::from)?;
        let name = layer.get_name().to_string();

        if let Err(error) = rebuilt.add_boxed(layer) {
            term.write_line(&format!(
                "{} Layer #{} ({}): {}",
                style("✗").red().bold(),
                index + 1,
                name,
                error
            ))
            .ok();
            return Err(error.into());
        }
    }
    if snapshot.frozen {
        rebuilt.freeze();
    }

    term.write_line(&format!(
        "{} {} layers, composition is valid{}",
        style("✓").green().bold(),
        rebuilt.len(),
        if rebuilt.is_frozen() { " (frozen)" } else { "" }
    ))
    .ok();

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}
