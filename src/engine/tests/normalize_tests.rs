//! Tests for timestamp parsing, deduplication, rain clamping and pressure units

use super::{date, raw, reading, reading_with, nominal, ts};
use crate::engine::normalize::*;
use crate::models::{Measurements, RawReading, RejectReason, StationSeries};

#[test]
fn test_parse_timestamp_layouts() {
    let expected = ts("2024-03-01 10:15:00");
    assert_eq!(parse_timestamp("2024-03-01 10:15:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01T10:15:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01 10:15"), Some(expected));
    assert_eq!(parse_timestamp("  2024-03-01T10:15  "), Some(expected));
    assert_eq!(parse_timestamp("2024-03-01 10:15:00.250").map(|t| t.date()), Some(expected.date()));
}

#[test]
fn test_parse_timestamp_with_offset_converts_to_utc() {
    assert_eq!(
        parse_timestamp("2024-03-01T13:15:00+03:00"),
        Some(ts("2024-03-01 10:15:00"))
    );
    assert_eq!(
        parse_timestamp("2024-03-01T10:15:00Z"),
        Some(ts("2024-03-01 10:15:00"))
    );
}

#[test]
fn test_parse_timestamp_bare_date_is_midnight() {
    assert_eq!(parse_timestamp("2024-03-01"), Some(ts("2024-03-01 00:00:00")));
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("not a time"), None);
    assert_eq!(parse_timestamp("2024-13-45 99:00:00"), None);
}

#[test]
fn test_malformed_records_are_rejected_not_fatal() {
    let input = vec![
        raw("TA00001", "2024-03-01 00:00:00"),
        raw("TA00001", "yesterday"),
        raw("", "2024-03-01 00:15:00"),
    ];

    let (readings, rejected) = parse_timestamps(input);

    assert_eq!(readings.len(), 1);
    assert_eq!(rejected.len(), 2);
    assert_eq!(rejected[0].reason, RejectReason::MalformedTimestamp);
    assert_eq!(rejected[0].reading.timestamp, "yesterday");
    assert_eq!(rejected[1].reason, RejectReason::MissingStation);
}

#[test]
fn test_supplied_date_is_kept() {
    let input = vec![raw("TA00001", "2024-03-01 23:45:00").with_date("2024-03-02")];
    let (readings, _) = parse_timestamps(input);
    assert_eq!(readings[0].date, date("2024-03-02"));

    let (readings, _) = parse_timestamps(vec![raw("TA00001", "2024-03-01 23:45:00")]);
    assert_eq!(readings[0].date, date("2024-03-01"));
}

#[test]
fn test_malformed_supplied_date_is_rejected() {
    let input = vec![
        raw("TA00001", "2024-03-01 23:45:00").with_date("02/03/2024"),
        raw("TA00001", "2024-03-02 00:00:00").with_date(" 2024-03-02 "),
    ];

    let (readings, rejected) = parse_timestamps(input);

    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].date, date("2024-03-02"));
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].reason, RejectReason::MalformedDate);
    assert_eq!(rejected[0].reading.date.as_deref(), Some("02/03/2024"));
}

#[test]
fn test_dedup_keeps_one_reading_per_timestamp() {
    let first = reading_with(
        "TA00001",
        "2024-03-01 00:15:00",
        Measurements {
            air_temperature: Some(21.0),
            ..nominal()
        },
    );
    let duplicate = reading_with(
        "TA00001",
        "2024-03-01 00:15:00",
        Measurements {
            air_temperature: Some(30.0),
            ..nominal()
        },
    );
    let readings = vec![
        reading("TA00001", "2024-03-01 00:30:00"),
        first,
        reading("TA00001", "2024-03-01 00:00:00"),
        duplicate,
    ];

    let (series, removed) = dedup_and_order(readings);

    assert_eq!(removed, 1);
    assert_eq!(series.len(), 1);
    let station = &series[0];
    assert_eq!(station.len(), 3);
    assert!(station
        .readings
        .windows(2)
        .all(|pair| pair[0].timestamp < pair[1].timestamp));
    // First occurrence in input order wins
    assert_eq!(station.readings[1].measurements.air_temperature, Some(21.0));
}

#[test]
fn test_dedup_partitions_stations_in_identifier_order() {
    let readings = vec![
        reading("TA00002", "2024-03-01 00:00:00"),
        reading("TA00001", "2024-03-01 00:00:00"),
        reading("TA00002", "2024-03-01 00:00:00"),
    ];

    let (series, removed) = dedup_and_order(readings);

    assert_eq!(removed, 1);
    let ids: Vec<&str> = series.iter().map(|s| s.device_id.as_str()).collect();
    assert_eq!(ids, vec!["TA00001", "TA00002"]);
    assert_eq!(series[0].len(), 1);
    assert_eq!(series[1].len(), 1);
}

#[test]
fn test_negative_rain_is_clamped_to_zero() {
    let mut readings = vec![
        reading_with(
            "TA00001",
            "2024-03-01 00:00:00",
            Measurements {
                rain_gauge: Some(-0.4),
                ..nominal()
            },
        ),
        reading_with(
            "TA00001",
            "2024-03-01 00:15:00",
            Measurements {
                rain_gauge: None,
                ..nominal()
            },
        ),
        reading_with(
            "TA00001",
            "2024-03-01 00:30:00",
            Measurements {
                rain_gauge: Some(1.2),
                ..nominal()
            },
        ),
    ];

    let clamped = clamp_rain(&mut readings);

    assert_eq!(clamped, 1);
    assert_eq!(readings[0].measurements.rain_gauge, Some(0.0));
    assert_eq!(readings[1].measurements.rain_gauge, None);
    assert_eq!(readings[2].measurements.rain_gauge, Some(1.2));
}

#[test]
fn test_approx_median() {
    assert_eq!(approx_median(vec![]), None);
    assert_eq!(approx_median(vec![5.0]), Some(5.0));
    assert_eq!(approx_median(vec![3.0, 1.0, 2.0]), Some(2.0));
    assert_eq!(approx_median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.0));
}

fn pressure_series(values: &[Option<f64>]) -> Vec<StationSeries> {
    let readings = values
        .iter()
        .enumerate()
        .map(|(i, p)| {
            reading_with(
                "TA00001",
                &format!("2024-03-01 00:{:02}:00", i * 15 % 60),
                Measurements {
                    barometric_pressure: *p,
                    ..nominal()
                },
            )
        })
        .collect();
    vec![StationSeries {
        device_id: "TA00001".to_string(),
        readings,
    }]
}

#[test]
fn test_pascal_dataset_is_rescaled() {
    let mut series = pressure_series(&[Some(101325.0), Some(101300.0), None]);

    let scaling = normalize_pressure_units(&mut series);

    assert!(scaling.rescaled);
    let hpa: Vec<Option<f64>> = series[0].readings.iter().map(|r| r.pressure_hpa).collect();
    assert!((hpa[0].unwrap() - 1013.25).abs() < 1e-9);
    assert!((hpa[1].unwrap() - 1013.0).abs() < 1e-9);
    assert_eq!(hpa[2], None);
}

#[test]
fn test_hectopascal_dataset_is_unchanged() {
    let mut series = pressure_series(&[Some(1013.0), Some(880.5)]);

    let scaling = normalize_pressure_units(&mut series);

    assert!(!scaling.rescaled);
    assert_eq!(series[0].readings[0].pressure_hpa, Some(1013.0));
    assert_eq!(series[0].readings[1].pressure_hpa, Some(880.5));
}

#[test]
fn test_unit_decision_is_dataset_wide() {
    // One hPa outlier in a Pa dataset is still divided
    let mut series = pressure_series(&[Some(101325.0), Some(101200.0), Some(1000.0)]);

    let scaling = normalize_pressure_units(&mut series);

    assert!(scaling.rescaled);
    assert_eq!(series[0].readings[2].pressure_hpa, Some(10.0));
}

#[test]
fn test_no_pressure_values() {
    let mut series = pressure_series(&[None, None]);
    let scaling = normalize_pressure_units(&mut series);
    assert_eq!(scaling.median, None);
    assert!(!scaling.rescaled);
}

#[test]
fn test_raw_reading_builder() {
    let record = RawReading::new("TA00001", "2024-03-01 00:00:00");
    assert_eq!(record.date, None);
    assert_eq!(record.measurements, Measurements::default());
}
