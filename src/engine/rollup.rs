//! Verdict rollup: failed and warning rule names per reading.

use crate::models::{Availability, RuleName, RuleVerdicts, Severity, TimeGapFlag, WindGate};

/// Where a verdict lands in the rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupClass {
    Failed,
    Warning,
    Clear,
}

/// Verdict types that can be summarised in the rollup lists
pub trait Rollup {
    fn rollup_class(&self) -> RollupClass;
}

impl Rollup for Severity {
    fn rollup_class(&self) -> RollupClass {
        match self {
            Severity::Fail => RollupClass::Failed,
            Severity::Warning => RollupClass::Warning,
            Severity::Ok => RollupClass::Clear,
        }
    }
}

// Irregular stands in for Fail; a regular or undefined gap is not reported
impl Rollup for TimeGapFlag {
    fn rollup_class(&self) -> RollupClass {
        match self {
            TimeGapFlag::Irregular => RollupClass::Failed,
            TimeGapFlag::Regular => RollupClass::Clear,
        }
    }
}

// The closed state of a binary gate shares the warning code
impl Rollup for WindGate {
    fn rollup_class(&self) -> RollupClass {
        match self {
            WindGate::Calm => RollupClass::Warning,
            WindGate::Windy => RollupClass::Clear,
        }
    }
}

impl Rollup for Availability {
    fn rollup_class(&self) -> RollupClass {
        match self {
            Availability::Insufficient => RollupClass::Warning,
            Availability::Available => RollupClass::Clear,
        }
    }
}

/// Every verdict of a reading with its rule name, in the fixed rollup order
pub fn ordered_outcomes(verdicts: &RuleVerdicts) -> Vec<(RuleName, RollupClass)> {
    let mut outcomes = vec![
        (RuleName::TimeGap, verdicts.time_gap.rollup_class()),
        (RuleName::TairRange, verdicts.tair_range.rollup_class()),
        (RuleName::RhRange, verdicts.rh_range.rollup_class()),
        (
            RuleName::WindSpeedRange,
            verdicts.wind_speed_range.rollup_class(),
        ),
        (RuleName::WindDirRange, verdicts.wind_dir_range.rollup_class()),
        (
            RuleName::WindDirRequiresWind,
            verdicts.wind_dir_requires_wind.rollup_class(),
        ),
        (RuleName::Rain15Min, verdicts.rain_15min.rollup_class()),
        (RuleName::TairStep, verdicts.tair_step.rollup_class()),
        (
            RuleName::DailyAvailability,
            verdicts.daily_availability.rollup_class(),
        ),
        (RuleName::RainDaily, verdicts.rain_daily.rollup_class()),
    ];

    if let Some(pressure) = verdicts.pressure_range {
        outcomes.push((RuleName::PressureRange, pressure.rollup_class()));
    }

    outcomes
}

/// Collect `(failed, warning)` rule names, each in rollup order.
///
/// Both lists are always present and may be empty.
pub fn collect(verdicts: &RuleVerdicts) -> (Vec<RuleName>, Vec<RuleName>) {
    let mut failed = Vec::new();
    let mut warning = Vec::new();

    for (name, class) in ordered_outcomes(verdicts) {
        match class {
            RollupClass::Failed => failed.push(name),
            RollupClass::Warning => warning.push(name),
            RollupClass::Clear => {}
        }
    }

    (failed, warning)
}
