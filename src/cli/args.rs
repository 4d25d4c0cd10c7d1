//! Command-line argument definitions for station quality control
//!
//! The `run` and `thresholds` subcommands, global verbosity flags and the
//! output path defaults.

use crate::io::OutputFormat;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "station-qc")]
#[command(about = "Level-1 quality control for automatic weather station readings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors, no progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the quality rules over a file or directory of readings
    Run(RunArgs),

    /// Print the effective thresholds and settings as TOML
    Thresholds {
        /// Configuration file with [settings] and [thresholds] tables
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// CSV / Parquet file, or a directory searched recursively
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <INPUT>_qc.<format> next to the input)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file with [settings] and [thresholds] tables
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Parquet)]
    pub format: OutputFormat,

    /// Also run the altitude-based pressure range check
    #[arg(long)]
    pub pressure_check: bool,

    /// Number of stations (and files) processed concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl Args {
    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl RunArgs {
    /// Output path, defaulting to `<input stem>_qc.<ext>` beside the input
    pub fn get_output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => {
                let stem = self
                    .input
                    .file_stem()
                    .unwrap_or_default()
                    .to_string_lossy();
                let parent = self.input.parent().unwrap_or(Path::new("."));
                parent.join(format!("{}_qc.{}", stem, self.format.extension()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let args = Args::parse_from([
            "station-qc",
            "run",
            "data/busia",
            "--format",
            "csv",
            "--pressure-check",
            "-w",
            "4",
            "-v",
        ]);

        assert_eq!(args.get_log_level(), "debug");
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.input, PathBuf::from("data/busia"));
                assert_eq!(run.format, OutputFormat::Csv);
                assert!(run.pressure_check);
                assert_eq!(run.workers, Some(4));
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_log_level() {
        let args = Args::parse_from(["station-qc", "-q", "thresholds"]);
        assert_eq!(args.get_log_level(), "warn");
        assert!(!args.show_progress());
    }

    #[test]
    fn test_default_output_path() {
        let args = Args::parse_from(["station-qc", "run", "/data/readings.csv"]);
        let Command::Run(run) = args.command else {
            panic!("Expected run command");
        };
        assert_eq!(
            run.get_output_path(),
            PathBuf::from("/data/readings_qc.parquet")
        );
    }

    #[test]
    fn test_explicit_output_path() {
        let args = Args::parse_from([
            "station-qc",
            "run",
            "/data/readings.csv",
            "-o",
            "/tmp/out.csv",
            "--format",
            "csv",
        ]);
        let Command::Run(run) = args.command else {
            panic!("Expected run command");
        };
        assert_eq!(run.get_output_path(), PathBuf::from("/tmp/out.csv"));
    }
}
