//! Reading normalization: timestamp parsing, deduplication and per-station
//! ordering, negative-rain clamping and pressure unit detection.
//!
//! All of this runs before any rule sees a reading. Deduplication and
//! ordering produce the per-station partition the temporal pass depends on;
//! pressure detection is a single dataset-wide decision.

use crate::constants::{
    DATE_FORMAT, PASCAL_MEDIAN_THRESHOLD, PASCALS_PER_HECTOPASCAL, TIMESTAMP_FORMATS,
};
use crate::error::QcError;
use crate::models::{RawReading, Reading, RejectReason, RejectedReading, StationSeries};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Parse a timestamp in any of the accepted layouts.
///
/// RFC 3339 values carrying an offset are converted to UTC. A bare date is
/// read as midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_utc());
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse raw readings, routing undecodable records to the rejected list.
///
/// A record whose timestamp cannot be parsed has no place in the station
/// time line, so none of its temporal checks can be computed. A supplied date
/// that cannot be parsed would silently move the reading into another
/// station-day. Both are excluded from evaluation and reported instead of
/// failing the batch.
pub fn parse_timestamps(raw: Vec<RawReading>) -> (Vec<Reading>, Vec<RejectedReading>) {
    let mut readings = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for record in raw {
        if record.device_id.trim().is_empty() {
            warn!(
                "Rejected reading at '{}': missing station identifier",
                record.timestamp
            );
            rejected.push(RejectedReading {
                reading: record,
                reason: RejectReason::MissingStation,
            });
            continue;
        }

        let Some(timestamp) = parse_timestamp(&record.timestamp) else {
            let error = QcError::MalformedTimestamp {
                station: record.device_id.clone(),
                value: record.timestamp.clone(),
            };
            warn!("Rejected reading: {}", error);
            rejected.push(RejectedReading {
                reading: record,
                reason: RejectReason::MalformedTimestamp,
            });
            continue;
        };

        let date = match record.date.as_deref() {
            None => timestamp.date(),
            Some(text) => match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
                Ok(date) => date,
                Err(_) => {
                    let error = QcError::MalformedDate {
                        station: record.device_id.clone(),
                        value: text.to_string(),
                    };
                    warn!("Rejected reading: {}", error);
                    rejected.push(RejectedReading {
                        reading: record,
                        reason: RejectReason::MalformedDate,
                    });
                    continue;
                }
            },
        };

        readings.push(Reading {
            date,
            pressure_hpa: record.measurements.barometric_pressure,
            device_id: record.device_id,
            timestamp,
            measurements: record.measurements,
        });
    }

    (readings, rejected)
}

/// Partition readings by station, order each station by time and drop
/// duplicate (station, timestamp) pairs.
///
/// Stations come back in ascending identifier order. Among duplicates the
/// first one seen in input order is kept. Returns the series and the number
/// of readings removed.
pub fn dedup_and_order(readings: Vec<Reading>) -> (Vec<StationSeries>, usize) {
    let mut groups: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(reading.device_id.clone())
            .or_default()
            .push(reading);
    }

    let mut duplicates_removed = 0;
    let series: Vec<StationSeries> = groups
        .into_iter()
        .map(|(device_id, mut readings)| {
            // Stable sort keeps input order among equal timestamps
            readings.sort_by_key(|r| r.timestamp);
            let before = readings.len();
            readings.dedup_by_key(|r| r.timestamp);
            let removed = before - readings.len();

            if removed > 0 {
                debug!(
                    "Station {}: removed {} duplicate timestamp(s)",
                    device_id, removed
                );
            }
            duplicates_removed += removed;

            StationSeries {
                device_id,
                readings,
            }
        })
        .collect();

    info!(
        "Deduplication complete: {} stations, {} duplicates removed",
        series.len(),
        duplicates_removed
    );

    (series, duplicates_removed)
}

/// Replace negative rain increments with exactly zero. Returns how many
/// values were changed. This is a correction, not a flagged condition.
pub fn clamp_rain(readings: &mut [Reading]) -> usize {
    let mut clamped = 0;
    for reading in readings.iter_mut() {
        if let Some(rain) = reading.measurements.rain_gauge {
            if rain < 0.0 {
                reading.measurements.rain_gauge = Some(0.0);
                clamped += 1;
            }
        }
    }
    clamped
}

/// Median of the values, or `None` when empty.
///
/// Returns the lower middle element for even counts, which is always an
/// observed value and well within the tolerance an approximate median allows.
pub fn approx_median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let middle = (values.len() - 1) / 2;
    let (_, median, _) = values.select_nth_unstable_by(middle, |a, b| a.total_cmp(b));
    Some(*median)
}

/// Result of the dataset-wide pressure unit decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureScaling {
    /// Median of all defined pressures before scaling
    pub median: Option<f64>,
    /// True when the dataset was detected as pascals and divided by 100
    pub rescaled: bool,
}

/// Detect the pressure unit for the whole dataset and normalize to hPa.
///
/// If the median pressure exceeds 2000 every value is assumed to be in
/// pascals and divided by 100; otherwise values pass through unchanged. The
/// decision is taken once over every station, never per reading.
pub fn normalize_pressure_units(series: &mut [StationSeries]) -> PressureScaling {
    let pressures: Vec<f64> = series
        .iter()
        .flat_map(|s| s.readings.iter())
        .filter_map(|r| r.measurements.barometric_pressure)
        .collect();

    let median = approx_median(pressures);
    let rescaled = median.is_some_and(|m| m > PASCAL_MEDIAN_THRESHOLD);

    for reading in series.iter_mut().flat_map(|s| s.readings.iter_mut()) {
        let raw = reading.measurements.barometric_pressure;
        reading.pressure_hpa = if rescaled {
            raw.map(|p| p / PASCALS_PER_HECTOPASCAL)
        } else {
            raw
        };
    }

    match median {
        Some(m) if rescaled => info!(
            "Pressure median {:.1} exceeds {}: converting Pa to hPa",
            m, PASCAL_MEDIAN_THRESHOLD
        ),
        Some(m) => debug!("Pressure median {:.1}: values already in hPa", m),
        None => debug!("No pressure values present"),
    }

    PressureScaling { median, rescaled }
}
