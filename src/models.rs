//! Core data structures for station quality control.
//!
//! Defines raw and normalized readings, derived features, daily aggregates,
//! verdict types and the final per-reading verdict record.

use crate::constants::codes;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Physical variables carried by every reading. Any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    /// Air temperature in degrees Celsius
    pub air_temperature: Option<f64>,
    /// Relative humidity in percent
    pub air_humidity: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_direction: Option<f64>,
    /// Rain gauge increment since the previous sample, in mm
    pub rain_gauge: Option<f64>,
    /// Barometric pressure as delivered (hPa or Pa, detected later)
    pub barometric_pressure: Option<f64>,
    /// Station altitude in metres
    pub altitude: Option<f64>,
}

/// A reading as delivered by the ingestion source, timestamp still text
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub device_id: String,
    pub timestamp: String,
    /// Calendar date text when the source supplies one
    pub date: Option<String>,
    pub measurements: Measurements,
}

impl RawReading {
    pub fn new(device_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: timestamp.into(),
            date: None,
            measurements: Measurements::default(),
        }
    }

    pub fn with_measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = measurements;
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// A reading with a parsed timestamp, ready for ordering and evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    /// Supplied date, or the timestamp's calendar date
    pub date: NaiveDate,
    pub measurements: Measurements,
    /// Pressure after unit normalization, always hPa
    pub pressure_hpa: Option<f64>,
}

/// All readings of one station in ascending timestamp order, unique per timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub device_id: String,
    pub readings: Vec<Reading>,
}

impl StationSeries {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Why a raw reading was excluded from evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The station identifier is empty
    MissingStation,
    /// The timestamp text could not be parsed
    MalformedTimestamp,
    /// A supplied date could not be parsed
    MalformedDate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingStation => write!(f, "missing station identifier"),
            RejectReason::MalformedTimestamp => write!(f, "malformed timestamp"),
            RejectReason::MalformedDate => write!(f, "malformed date"),
        }
    }
}

/// A raw reading that could not enter the temporal pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedReading {
    pub reading: RawReading,
    pub reason: RejectReason,
}

/// Per-reading scalars derived from the station's previous reading and its metadata
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedFeatures {
    /// Minutes since the previous reading of the same station
    pub time_diff_minutes: Option<f64>,
    /// Air temperature change since the previous reading
    pub tair_step: Option<f64>,
    /// Expected station pressure from altitude
    pub expected_pressure_hpa: Option<f64>,
    /// Absolute deviation of the normalized pressure from the expected value
    pub pressure_abs_dev_hpa: Option<f64>,
}

/// Statistics for one (station, date), identical for every reading of that day
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyAggregate {
    /// Number of retained readings on the day
    pub observed_samples: usize,
    /// observed_samples / expected samples per day, not clamped
    pub valid_fraction: f64,
    /// Sum of clamped rain increments; undefined when no increment is present
    pub rain_total_mm: Option<f64>,
}

/// Outcome of a three-level check. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Fail,
}

impl Severity {
    pub fn code(self) -> i32 {
        match self {
            Severity::Ok => codes::OK,
            Severity::Warning => codes::WARNING,
            Severity::Fail => codes::FAIL,
        }
    }
}

/// Outcome of the binary time-gap check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeGapFlag {
    #[default]
    Regular,
    Irregular,
}

impl TimeGapFlag {
    pub fn code(self) -> i32 {
        match self {
            TimeGapFlag::Regular => codes::GAP_REGULAR,
            TimeGapFlag::Irregular => codes::GAP_IRREGULAR,
        }
    }
}

/// Whether there is enough wind for the direction sensor to be meaningful
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WindGate {
    Calm,
    #[default]
    Windy,
}

impl WindGate {
    pub fn code(self) -> i32 {
        match self {
            WindGate::Calm => codes::GATE_CLOSED,
            WindGate::Windy => codes::GATE_OPEN,
        }
    }
}

/// Daily sample availability verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Availability {
    #[default]
    Available,
    Insufficient,
}

impl Availability {
    pub fn code(self) -> i32 {
        match self {
            Availability::Available => codes::GATE_OPEN,
            Availability::Insufficient => codes::GATE_CLOSED,
        }
    }
}

/// Names of the checks, in rollup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleName {
    TimeGap,
    TairRange,
    RhRange,
    WindSpeedRange,
    WindDirRange,
    WindDirRequiresWind,
    Rain15Min,
    TairStep,
    DailyAvailability,
    RainDaily,
    PressureRange,
}

impl RuleName {
    /// The fixed rollup order of the always-on checks
    pub const CORE: [RuleName; 10] = [
        RuleName::TimeGap,
        RuleName::TairRange,
        RuleName::RhRange,
        RuleName::WindSpeedRange,
        RuleName::WindDirRange,
        RuleName::WindDirRequiresWind,
        RuleName::Rain15Min,
        RuleName::TairStep,
        RuleName::DailyAvailability,
        RuleName::RainDaily,
    ];

    /// Output column / rollup name
    pub fn as_str(self) -> &'static str {
        match self {
            RuleName::TimeGap => "QC_time_gap",
            RuleName::TairRange => "QC_Tair_range",
            RuleName::RhRange => "QC_RH_range",
            RuleName::WindSpeedRange => "QC_WindSpeed_range",
            RuleName::WindDirRange => "QC_WindDir_range",
            RuleName::WindDirRequiresWind => "QC_WindDir_requires_wind",
            RuleName::Rain15Min => "QC_Rain_15min",
            RuleName::TairStep => "QC_Tair_step",
            RuleName::DailyAvailability => "QC_Daily_Availability",
            RuleName::RainDaily => "QC_Rain_Daily",
            RuleName::PressureRange => "QC_Pressure_range",
        }
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verdict per rule for a single reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleVerdicts {
    pub time_gap: TimeGapFlag,
    pub tair_range: Severity,
    pub rh_range: Severity,
    pub wind_speed_range: Severity,
    pub wind_dir_range: Severity,
    pub wind_dir_requires_wind: WindGate,
    pub rain_15min: Severity,
    pub tair_step: Severity,
    pub daily_availability: Availability,
    pub rain_daily: Severity,
    /// Present only when the pressure check is enabled
    pub pressure_range: Option<Severity>,
}

/// Final output unit: the reading, its features and all verdicts
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictRecord {
    pub reading: Reading,
    pub features: DerivedFeatures,
    pub daily: DailyAggregate,
    pub verdicts: RuleVerdicts,
    /// Rules that failed, in rollup order
    pub failed_checks: Vec<RuleName>,
    /// Rules that warned, in rollup order
    pub warning_checks: Vec<RuleName>,
}

impl VerdictRecord {
    /// True when no rule failed or warned
    pub fn is_clean(&self) -> bool {
        self.failed_checks.is_empty() && self.warning_checks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Fail > Severity::Warning);
        assert!(Severity::Warning > Severity::Ok);
        assert_eq!(Severity::default(), Severity::Ok);
        assert_eq!(
            [Severity::Ok, Severity::Fail, Severity::Warning]
                .into_iter()
                .max(),
            Some(Severity::Fail)
        );
    }

    #[test]
    fn test_verdict_codes() {
        assert_eq!(Severity::Fail.code(), -2);
        assert_eq!(Severity::Warning.code(), 0);
        assert_eq!(Severity::Ok.code(), 1);
        assert_eq!(TimeGapFlag::Regular.code(), 0);
        assert_eq!(TimeGapFlag::Irregular.code(), -1);
        assert_eq!(WindGate::Calm.code(), 0);
        assert_eq!(Availability::Insufficient.code(), 0);
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<&str> = RuleName::CORE.iter().map(|r| r.as_str()).collect();
        names.push(RuleName::PressureRange.as_str());
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
