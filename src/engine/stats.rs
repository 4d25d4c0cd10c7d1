//! Run statistics and the outcome structure returned by the engine.

use crate::models::{RejectedReading, RuleName, VerdictRecord};
use std::collections::BTreeMap;

/// Statistics for one quality-control run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QcStats {
    /// Raw readings handed to the engine
    pub total_input: usize,
    /// Readings excluded before evaluation (malformed timestamp, no station)
    pub rejected: usize,
    /// Readings dropped as duplicate (station, timestamp)
    pub duplicates_removed: usize,
    /// Negative rain increments clamped to zero
    pub rain_clamped: usize,
    /// Median of raw pressures, if any were present
    pub pressure_median: Option<f64>,
    /// Whether pressures were converted from Pa to hPa
    pub pressure_rescaled: bool,
    /// Number of distinct stations evaluated
    pub stations: usize,
    /// Number of distinct (station, date) pairs evaluated
    pub station_days: usize,
    /// Verdict records produced
    pub evaluated: usize,
    /// Records with at least one failed check
    pub records_failed: usize,
    /// Records with warnings but no failures
    pub records_warned: usize,
    /// Failures per rule
    pub rule_failures: BTreeMap<RuleName, usize>,
    /// Warnings per rule
    pub rule_warnings: BTreeMap<RuleName, usize>,
}

impl QcStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one finished verdict record
    pub fn record(&mut self, record: &VerdictRecord) {
        self.evaluated += 1;
        if record.is_clean() {
            return;
        }
        if record.failed_checks.is_empty() {
            self.records_warned += 1;
        } else {
            self.records_failed += 1;
        }
        for name in &record.failed_checks {
            *self.rule_failures.entry(*name).or_insert(0) += 1;
        }
        for name in &record.warning_checks {
            *self.rule_warnings.entry(*name).or_insert(0) += 1;
        }
    }

    /// Records with neither failures nor warnings
    pub fn records_clean(&self) -> usize {
        self.evaluated - self.records_failed - self.records_warned
    }

    /// Percentage of input readings that were evaluated
    pub fn evaluation_rate(&self) -> f64 {
        if self.total_input == 0 {
            100.0
        } else {
            (self.evaluated as f64 / self.total_input as f64) * 100.0
        }
    }

    /// Percentage of evaluated records without any failed check
    pub fn pass_rate(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            ((self.evaluated - self.records_failed) as f64 / self.evaluated as f64) * 100.0
        }
    }

    /// Get summary of run statistics
    pub fn summary(&self) -> String {
        format!(
            "QC Summary: {} -> {} readings ({:.1}% evaluated) | \
             Stations: {} | Station-days: {} | Duplicates: {} | Rejected: {} | \
             Failed: {} | Warned: {} | Clean: {}",
            self.total_input,
            self.evaluated,
            self.evaluation_rate(),
            self.stations,
            self.station_days,
            self.duplicates_removed,
            self.rejected,
            self.records_failed,
            self.records_warned,
            self.records_clean()
        )
    }
}

/// Result of a quality-control run
#[derive(Debug, Clone)]
pub struct QcOutcome {
    /// One verdict record per retained reading, grouped by station in
    /// ascending identifier order, each station in time order
    pub records: Vec<VerdictRecord>,
    /// Readings excluded before evaluation, with the reason
    pub rejected: Vec<RejectedReading>,
    /// Run statistics
    pub stats: QcStats,
}

impl QcOutcome {
    /// Get the number of verdict records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        self.stats.summary()
    }
}
