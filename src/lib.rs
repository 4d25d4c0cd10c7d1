//! Station QC Library
//!
//! Level-1 quality control for automatic weather station readings. Raw
//! readings from many stations are normalized, ordered per station, checked
//! against physical and climatological thresholds, aggregated per day and
//! rolled up into per-reading lists of failed and warning checks.
//!
//! This library provides tools for:
//! - Parsing timestamps and deduplicating readings per station
//! - Detecting pressure units (Pa vs hPa) over a whole dataset
//! - Three-level (Ok / Warning / Fail) range, step and accumulation checks
//! - Daily availability and rainfall checks broadcast to every reading
//! - Reading CSV / Parquet feeds and writing enriched Parquet or CSV output

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod thresholds;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{QcConfig, QcSettings};
pub use engine::{QcEngine, QcOutcome, QcStats};
pub use error::{QcError, Result};
pub use models::{RawReading, RuleName, Severity, VerdictRecord};
pub use thresholds::Thresholds;
