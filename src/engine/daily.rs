//! Daily aggregation and the checks that read it.
//!
//! Aggregation is a two-pass process: a complete reduction per
//! (station, date) into a lookup table, then an enrichment pass that hands
//! every reading its day's aggregate. No reading ever sees a partial day.

use super::severity::{above, at_most, evaluate};
use crate::models::{Availability, DailyAggregate, Reading, Severity};
use crate::thresholds::Thresholds;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Lookup key for a station-day
pub type DayKey<'a> = (&'a str, NaiveDate);

/// Reduce readings to one aggregate per (station, date).
///
/// The availability fraction is the observed count over
/// `expected_samples_per_day` and may exceed 1.0. The rain total sums the
/// (already clamped) increments that are present and is undefined when none
/// are.
pub fn daily_stats(
    readings: &[Reading],
    expected_samples_per_day: u32,
) -> BTreeMap<DayKey<'_>, DailyAggregate> {
    let mut aggregates: BTreeMap<DayKey<'_>, DailyAggregate> = BTreeMap::new();

    for reading in readings {
        let entry = aggregates
            .entry((reading.device_id.as_str(), reading.date))
            .or_default();
        entry.observed_samples += 1;
        if let Some(rain) = reading.measurements.rain_gauge {
            entry.rain_total_mm = Some(entry.rain_total_mm.unwrap_or(0.0) + rain);
        }
    }

    let expected = f64::from(expected_samples_per_day);
    for aggregate in aggregates.values_mut() {
        aggregate.valid_fraction = aggregate.observed_samples as f64 / expected;
    }

    aggregates
}

/// Left-join aggregates onto readings by (station, date).
///
/// A reading without a matching key receives an empty aggregate (zero
/// samples, undefined rain).
pub fn join_daily(
    readings: &[Reading],
    aggregates: &BTreeMap<DayKey<'_>, DailyAggregate>,
) -> Vec<DailyAggregate> {
    readings
        .iter()
        .map(|r| {
            aggregates
                .get(&(r.device_id.as_str(), r.date))
                .copied()
                .unwrap_or_default()
        })
        .collect()
}

/// Daily availability: insufficient below the minimum fraction
pub fn availability_check(aggregate: &DailyAggregate, thr: &Thresholds) -> Availability {
    if aggregate.valid_fraction < thr.min_daily_avail {
        Availability::Insufficient
    } else {
        Availability::Available
    }
}

/// Daily rain total against the warning and maximum daily limits
pub fn daily_rain_check(aggregate: &DailyAggregate, thr: &Thresholds) -> Severity {
    let total = aggregate.rain_total_mm;
    evaluate(
        at_most(total, thr.rain_warn_daily),
        Some(at_most(total, thr.rain_max_daily)),
        Some(above(total, thr.rain_max_daily)),
    )
}
