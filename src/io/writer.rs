//! Writing verdict records and rejected readings
//!
//! Verdict records become one wide frame: the reading, its derived features
//! and daily aggregate, one integer code column per rule, and the two
//! rollup lists. Parquet keeps the rollups as list columns; CSV has no list
//! type, so there they are joined with [`CHECK_LIST_SEPARATOR`].

use crate::constants::{columns, CHECK_LIST_SEPARATOR, OUTPUT_TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::models::{RejectedReading, RuleName, VerdictRecord};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Snappy-compressed Parquet with list columns for the rollups
    #[default]
    Parquet,
    /// Flat CSV with `;`-joined rollups
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Build the output frame for a set of verdict records
///
/// The pressure verdict column is only present when the pressure check ran.
pub fn records_frame(records: &[VerdictRecord], format: OutputFormat) -> Result<DataFrame> {
    let text = |name: &str, f: &dyn Fn(&VerdictRecord) -> String| -> Column {
        Series::new(name.into(), records.iter().map(f).collect::<Vec<_>>()).into()
    };
    let float = |name: &str, f: &dyn Fn(&VerdictRecord) -> Option<f64>| -> Column {
        Series::new(name.into(), records.iter().map(f).collect::<Vec<_>>()).into()
    };
    let code = |name: &str, f: &dyn Fn(&VerdictRecord) -> i32| -> Column {
        Series::new(name.into(), records.iter().map(f).collect::<Vec<_>>()).into()
    };

    let timestamps: Vec<_> = records.iter().map(|r| r.reading.timestamp).collect();
    let dates: Vec<_> = records.iter().map(|r| r.reading.date).collect();
    let valid_fraction: Vec<f64> = records.iter().map(|r| r.daily.valid_fraction).collect();

    let mut frame_columns: Vec<Column> = vec![
        text(columns::DEVICE_ID, &|r| r.reading.device_id.clone()),
        Series::new(columns::TIMESTAMP.into(), timestamps).into(),
        Series::new(columns::DATE.into(), dates).into(),
        float(columns::AIR_TEMPERATURE, &|r| {
            r.reading.measurements.air_temperature
        }),
        float(columns::AIR_HUMIDITY, &|r| r.reading.measurements.air_humidity),
        float(columns::WIND_SPEED, &|r| r.reading.measurements.wind_speed),
        float(columns::WIND_DIRECTION, &|r| {
            r.reading.measurements.wind_direction
        }),
        float(columns::RAIN_GAUGE, &|r| r.reading.measurements.rain_gauge),
        float(columns::BAROMETRIC_PRESSURE, &|r| {
            r.reading.measurements.barometric_pressure
        }),
        float(columns::ALTITUDE, &|r| r.reading.measurements.altitude),
        float(columns::PRESSURE_HPA, &|r| r.reading.pressure_hpa),
        float(columns::TIME_DIFF, &|r| r.features.time_diff_minutes),
        float(columns::TAIR_STEP, &|r| r.features.tair_step),
        float(columns::EXPECTED_PRESSURE_HPA, &|r| {
            r.features.expected_pressure_hpa
        }),
        float(columns::PRESSURE_ABS_DEV_HPA, &|r| {
            r.features.pressure_abs_dev_hpa
        }),
        Series::new(columns::DAILY_VALID_FRAC.into(), valid_fraction).into(),
        float(columns::DAILY_RAIN_MM, &|r| r.daily.rain_total_mm),
        code(RuleName::TimeGap.as_str(), &|r| r.verdicts.time_gap.code()),
        code(RuleName::TairRange.as_str(), &|r| r.verdicts.tair_range.code()),
        code(RuleName::RhRange.as_str(), &|r| r.verdicts.rh_range.code()),
        code(RuleName::WindSpeedRange.as_str(), &|r| {
            r.verdicts.wind_speed_range.code()
        }),
        code(RuleName::WindDirRange.as_str(), &|r| {
            r.verdicts.wind_dir_range.code()
        }),
        code(RuleName::WindDirRequiresWind.as_str(), &|r| {
            r.verdicts.wind_dir_requires_wind.code()
        }),
        code(RuleName::Rain15Min.as_str(), &|r| r.verdicts.rain_15min.code()),
        code(RuleName::TairStep.as_str(), &|r| r.verdicts.tair_step.code()),
        code(RuleName::DailyAvailability.as_str(), &|r| {
            r.verdicts.daily_availability.code()
        }),
        code(RuleName::RainDaily.as_str(), &|r| r.verdicts.rain_daily.code()),
    ];

    if records.iter().any(|r| r.verdicts.pressure_range.is_some()) {
        let pressure: Vec<Option<i32>> = records
            .iter()
            .map(|r| r.verdicts.pressure_range.map(|s| s.code()))
            .collect();
        frame_columns.push(Series::new(RuleName::PressureRange.as_str().into(), pressure).into());
    }

    frame_columns.push(check_list_column(
        columns::FAILED_CHECKS,
        records.iter().map(|r| r.failed_checks.as_slice()),
        format,
    ));
    frame_columns.push(check_list_column(
        columns::WARNING_CHECKS,
        records.iter().map(|r| r.warning_checks.as_slice()),
        format,
    ));

    Ok(DataFrame::new(frame_columns)?)
}

fn check_list_column<'a>(
    name: &str,
    lists: impl Iterator<Item = &'a [RuleName]>,
    format: OutputFormat,
) -> Column {
    match format {
        OutputFormat::Parquet => {
            let values: Vec<Series> = lists
                .map(|names| {
                    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
                    Series::new(PlSmallStr::EMPTY, names)
                })
                .collect();
            Series::new(name.into(), values).into()
        }
        OutputFormat::Csv => {
            let values: Vec<String> = lists
                .map(|names| {
                    names
                        .iter()
                        .map(|n| n.as_str())
                        .collect::<Vec<_>>()
                        .join(CHECK_LIST_SEPARATOR)
                })
                .collect();
            Series::new(name.into(), values).into()
        }
    }
}

/// Write verdict records, returning the number of rows written
pub fn write_records(records: &[VerdictRecord], path: &Path, format: OutputFormat) -> Result<usize> {
    let mut df = records_frame(records, format)?;
    write_frame(&mut df, path, format)?;
    debug!("Wrote {} verdict records to {}", df.height(), path.display());
    Ok(df.height())
}

/// Sidecar path for rejected readings: `<stem>.rejected.csv` next to the output
pub fn rejected_path(output: &Path) -> PathBuf {
    output.with_extension("rejected.csv")
}

/// Build the frame of rejected readings with their reason
pub fn rejected_frame(rejected: &[RejectedReading]) -> Result<DataFrame> {
    let device_ids: Vec<&str> = rejected.iter().map(|r| r.reading.device_id.as_str()).collect();
    let timestamps: Vec<&str> = rejected.iter().map(|r| r.reading.timestamp.as_str()).collect();
    let dates: Vec<Option<&str>> = rejected.iter().map(|r| r.reading.date.as_deref()).collect();
    let reasons: Vec<String> = rejected.iter().map(|r| r.reason.to_string()).collect();

    Ok(DataFrame::new(vec![
        Series::new(columns::DEVICE_ID.into(), device_ids).into(),
        Series::new(columns::TIMESTAMP.into(), timestamps).into(),
        Series::new(columns::DATE.into(), dates).into(),
        Series::new("reason".into(), reasons).into(),
    ])?)
}

/// Write rejected readings as CSV, returning the number of rows written
pub fn write_rejected(rejected: &[RejectedReading], path: &Path) -> Result<usize> {
    let mut df = rejected_frame(rejected)?;
    write_frame(&mut df, path, OutputFormat::Csv)?;
    debug!("Wrote {} rejected readings to {}", df.height(), path.display());
    Ok(df.height())
}

fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    match format {
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)?;
        }
        OutputFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_datetime_format(Some(OUTPUT_TIMESTAMP_FORMAT.to_string()))
                .finish(df)?;
        }
    }
    Ok(())
}
