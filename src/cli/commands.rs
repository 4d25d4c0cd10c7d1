//! Command implementations for station quality control
//!
//! Logging setup, the `run` and `thresholds` commands, progress reporting
//! and the end-of-run summary.

use crate::cli::args::{Args, Command, RunArgs};
use crate::config::QcConfig;
use crate::engine::{QcEngine, QcOutcome};
use crate::io;
use crate::models::RuleName;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("station_qc={}", log_level)));

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

    debug!("Logging initialized at level: {}", log_level);
}

/// Dispatch the parsed command
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args);
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Command::Run(run_args) => run_quality_control(run_args, args.show_progress()).await,
        Command::Thresholds { config } => print_thresholds(config.as_deref()),
    }
}

/// Load the configuration file if given, otherwise the built-in preset
fn load_configuration(path: Option<&Path>) -> Result<QcConfig> {
    match path {
        Some(path) => QcConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            debug!("No configuration file given, using Busia thresholds");
            Ok(QcConfig::default())
        }
    }
}

async fn run_quality_control(args: &RunArgs, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_configuration(args.config.as_deref())?;
    if args.pressure_check {
        config.settings = config.settings.with_pressure_check();
    }
    if let Some(workers) = args.workers {
        config.settings = config.settings.with_workers(workers);
    }
    let workers = config.settings.workers;
    let engine = QcEngine::from_config(config).context("Invalid configuration")?;

    let files = io::discover_inputs(&args.input)
        .with_context(|| format!("Failed to discover inputs under {}", args.input.display()))?;
    if files.is_empty() {
        anyhow::bail!("No CSV or Parquet files found under {}", args.input.display());
    }
    info!("Found {} input files", files.len());

    let load_bar = show_progress.then(|| progress_bar(files.len() as u64, "Loading files"));
    let raw = io::load_inputs(&files, workers, load_bar.as_ref())
        .await
        .context("Failed to load readings")?;
    if let Some(pb) = &load_bar {
        pb.finish_with_message(format!("Loaded {} readings", raw.len()));
    }

    let eval_bar = show_progress.then(|| progress_bar(0, "Evaluating stations"));
    let outcome = engine
        .evaluate_concurrent(raw, eval_bar.as_ref())
        .await
        .context("Quality control failed")?;
    if let Some(pb) = &eval_bar {
        pb.finish_with_message("Evaluation complete");
    }

    let output_path = args.get_output_path();
    let rows = io::write_records(&outcome.records, &output_path, args.format)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!("Wrote {} verdict records to {}", rows, output_path.display());

    let rejected_path = if outcome.rejected.is_empty() {
        None
    } else {
        let path = io::rejected_path(&output_path);
        io::write_rejected(&outcome.rejected, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        warn!(
            "{} readings rejected, see {}",
            outcome.rejected.len(),
            path.display()
        );
        Some(path)
    };

    print_report(
        &outcome,
        &output_path,
        rejected_path.as_deref(),
        start_time.elapsed(),
    );
    Ok(())
}

fn progress_bar(length: u64, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

fn print_thresholds(config: Option<&Path>) -> Result<()> {
    let config = load_configuration(config)?;
    let text = config
        .to_toml_string()
        .context("Failed to render configuration")?;
    print!("{}", text);
    Ok(())
}

/// Print the end-of-run summary
fn print_report(
    outcome: &QcOutcome,
    output_path: &Path,
    rejected_path: Option<&Path>,
    elapsed: Duration,
) {
    let stats = &outcome.stats;

    println!();
    println!("{}", "Quality Control Complete".bright_green().bold());
    println!("{}", "========================".bright_green());
    println!("  Readings in:        {}", stats.total_input);
    println!("  Records evaluated:  {}", stats.evaluated.to_string().bright_cyan());
    println!("  Stations:           {}", stats.stations);
    println!("  Station-days:       {}", stats.station_days);
    println!("  Duplicates removed: {}", stats.duplicates_removed);
    println!("  Rain values clamped: {}", stats.rain_clamped);
    match stats.pressure_median {
        Some(median) if stats.pressure_rescaled => println!(
            "  Pressure:           median {:.1}, converted Pa -> hPa",
            median
        ),
        Some(median) => println!("  Pressure:           median {:.1} hPa", median),
        None => println!("  Pressure:           no values"),
    }
    if stats.rejected > 0 {
        println!(
            "  Rejected:           {}",
            stats.rejected.to_string().bright_red()
        );
    }
    println!();
    println!(
        "  Failed: {}  Warned: {}  Clean: {}  ({:.1}% without failures)",
        stats.records_failed.to_string().bright_red(),
        stats.records_warned.to_string().bright_yellow(),
        stats.records_clean().to_string().bright_green(),
        stats.pass_rate()
    );

    let mut rules: Vec<RuleName> = RuleName::CORE.to_vec();
    rules.push(RuleName::PressureRange);
    let rows: Vec<(RuleName, usize, usize)> = rules
        .into_iter()
        .map(|rule| {
            (
                rule,
                stats.rule_failures.get(&rule).copied().unwrap_or(0),
                stats.rule_warnings.get(&rule).copied().unwrap_or(0),
            )
        })
        .filter(|(_, failed, warned)| failed + warned > 0)
        .collect();

    if !rows.is_empty() {
        println!();
        println!("  {:<28} {:>10} {:>10}", "Rule".bold(), "Failed".bold(), "Warned".bold());
        for (rule, failed, warned) in rows {
            println!(
                "  {:<28} {:>10} {:>10}",
                rule.as_str(),
                failed.to_string().red(),
                warned.to_string().yellow()
            );
        }
    }

    println!();
    println!("  Output:   {}", output_path.display().to_string().bright_cyan());
    if let Some(path) = rejected_path {
        println!("  Rejected: {}", path.display());
    }
    println!("  Time:     {}", HumanDuration(elapsed));
    println!();
}
