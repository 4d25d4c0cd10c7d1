//! Test utilities for the quality-control engine
//!
//! Fixture builders shared by the engine test modules. Nominal measurements
//! sit inside every Busia physical band and fail nothing, so tests only need
//! to perturb the variable under test.

use crate::config::QcSettings;
use crate::engine::QcEngine;
use crate::models::{Measurements, RawReading, Reading};
use crate::thresholds::Thresholds;
use chrono::{Duration, NaiveDate, NaiveDateTime};

mod normalize_tests;

/// Measurements that fail no check under the Busia thresholds
pub fn nominal() -> Measurements {
    Measurements {
        air_temperature: Some(24.0),
        air_humidity: Some(65.0),
        wind_speed: Some(2.5),
        wind_direction: Some(180.0),
        rain_gauge: Some(0.0),
        barometric_pressure: Some(880.0),
        altitude: Some(1200.0),
    }
}

/// Parse a `%Y-%m-%d %H:%M:%S` timestamp
pub fn ts(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Normalized reading with nominal measurements
pub fn reading(device_id: &str, timestamp: &str) -> Reading {
    reading_with(device_id, timestamp, nominal())
}

/// Normalized reading with the given measurements
pub fn reading_with(device_id: &str, timestamp: &str, measurements: Measurements) -> Reading {
    let timestamp = ts(timestamp);
    Reading {
        device_id: device_id.to_string(),
        timestamp,
        date: timestamp.date(),
        measurements,
        pressure_hpa: measurements.barometric_pressure,
    }
}

/// Raw reading with nominal measurements
pub fn raw(device_id: &str, timestamp: &str) -> RawReading {
    RawReading::new(device_id, timestamp).with_measurements(nominal())
}

/// Raw reading with a specific air temperature
pub fn raw_with_temperature(device_id: &str, timestamp: &str, temperature: f64) -> RawReading {
    RawReading::new(device_id, timestamp).with_measurements(Measurements {
        air_temperature: Some(temperature),
        ..nominal()
    })
}

/// `count` nominal raw readings at the 15-minute cadence starting at midnight
pub fn day_of_readings(device_id: &str, date: NaiveDate, count: usize) -> Vec<RawReading> {
    let start = date.and_hms_opt(0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let at = start + Duration::minutes(15 * i as i64);
            raw(device_id, &at.format("%Y-%m-%d %H:%M:%S").to_string())
        })
        .collect()
}

pub fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

/// Engine with Busia thresholds and default settings
pub fn busia_engine() -> QcEngine {
    QcEngine::new(Thresholds::busia(), QcSettings::default().with_workers(2)).unwrap()
}
