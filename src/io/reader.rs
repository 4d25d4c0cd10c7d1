//! Reading station feeds into raw readings
//!
//! Files are loaded with polars and converted column by column. CSV files
//! are read against a schema pinned from their header: identifiers, dates
//! and timestamps stay as text, so station ids are never reinterpreted as
//! numbers and malformed timestamps reach the normalizer instead of failing
//! the whole file. Measurement cells that do not parse, and NaN, become
//! missing.

use crate::constants::columns;
use crate::error::{QcError, Result};
use crate::io::discovery::InputFormat;
use crate::models::{Measurements, RawReading};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

/// Load a CSV or Parquet file into a data frame
pub fn load_frame(path: &Path) -> Result<DataFrame> {
    let df = match InputFormat::from_path(path) {
        Some(InputFormat::Csv) => CsvReadOptions::default()
            .with_has_header(true)
            .with_schema(Some(Arc::new(csv_schema(path)?)))
            .with_ignore_errors(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        Some(InputFormat::Parquet) => ParquetReader::new(File::open(path)?).finish()?,
        None => {
            return Err(QcError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    debug!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Build the read schema for a CSV file from its header line
pub fn csv_schema(path: &Path) -> Result<Schema> {
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;

    let header = header.trim_start_matches('\u{feff}').trim_end();
    if header.is_empty() {
        return Err(QcError::MissingColumn {
            path: path.to_path_buf(),
            column: columns::DEVICE_ID.to_string(),
        });
    }

    let fields = header.split(',').map(|name| {
        let name = name.trim().trim_matches('"');
        Field::new(name.into(), column_type(name))
    });
    Ok(Schema::from_iter(fields))
}

/// Data type for an input column, by name
fn column_type(name: &str) -> DataType {
    if columns::NUMERIC.contains(&name) {
        DataType::Float64
    } else {
        DataType::String
    }
}

/// Read one file into raw readings
pub fn read_readings(path: &Path) -> Result<Vec<RawReading>> {
    let df = load_frame(path)?;
    frame_to_readings(&df, path)
}

/// Convert a loaded frame into raw readings, in row order
///
/// Every column in [`columns::REQUIRED`] must be present. `date` and
/// `altitude` are optional. The date is carried as text and checked by the
/// normalizer.
pub fn frame_to_readings(df: &DataFrame, path: &Path) -> Result<Vec<RawReading>> {
    for column in columns::REQUIRED {
        if df.get_column_index(column).is_none() {
            return Err(QcError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let device_ids = text_values(df, columns::DEVICE_ID)?;
    let timestamps = text_values(df, columns::TIMESTAMP)?;
    let dates = text_values(df, columns::DATE)?;
    let air_temperature = float_values(df, columns::AIR_TEMPERATURE)?;
    let air_humidity = float_values(df, columns::AIR_HUMIDITY)?;
    let wind_speed = float_values(df, columns::WIND_SPEED)?;
    let wind_direction = float_values(df, columns::WIND_DIRECTION)?;
    let rain_gauge = float_values(df, columns::RAIN_GAUGE)?;
    let barometric_pressure = float_values(df, columns::BAROMETRIC_PRESSURE)?;
    let altitude = float_values(df, columns::ALTITUDE)?;

    let readings = (0..df.height())
        .map(|i| RawReading {
            device_id: device_ids[i].clone().unwrap_or_default(),
            timestamp: timestamps[i].clone().unwrap_or_default(),
            date: dates[i].clone().filter(|d| !d.trim().is_empty()),
            measurements: Measurements {
                air_temperature: air_temperature[i],
                air_humidity: air_humidity[i],
                wind_speed: wind_speed[i],
                wind_direction: wind_direction[i],
                rain_gauge: rain_gauge[i],
                barometric_pressure: barometric_pressure[i],
                altitude: altitude[i],
            },
        })
        .collect();

    Ok(readings)
}

/// Load every input file, at most `workers` at a time.
///
/// Files are read on the blocking pool. Readings are concatenated in the
/// order of `paths`, so the first occurrence of a duplicate stays stable
/// between runs.
pub async fn load_inputs(
    paths: &[PathBuf],
    workers: usize,
    progress_bar: Option<&ProgressBar>,
) -> Result<Vec<RawReading>> {
    let batches: Vec<Result<Vec<RawReading>>> = stream::iter(paths)
        .map(|path| {
            let pb = progress_bar.cloned();
            async move {
                let owned = path.clone();
                let readings = task::spawn_blocking(move || read_readings(&owned))
                    .await
                    .map_err(|e| {
                        QcError::Io(std::io::Error::other(format!(
                            "Failed to read {}: {}",
                            path.display(),
                            e
                        )))
                    })??;

                if let Some(pb) = pb {
                    if let Some(file_name) = path.file_name() {
                        pb.set_message(format!("Loaded: {}", file_name.to_string_lossy()));
                    }
                    pb.inc(1);
                }
                Ok::<_, QcError>(readings)
            }
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    let mut readings = Vec::new();
    for batch in batches {
        readings.extend(batch?);
    }

    info!("Loaded {} readings from {} files", readings.len(), paths.len());
    Ok(readings)
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if df.get_column_index(name).is_none() {
        return Ok(vec![None; df.height()]);
    }

    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if df.get_column_index(name).is_none() {
        return Ok(vec![None; df.height()]);
    }

    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "device_id,processing_timestamp,air_temperature,air_humidity,wind_speed,wind_direction_sensor,rain_gauge,barometric_pressure";

    fn write_csv(temp_dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = temp_dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_read_csv_readings() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            &format!(
                "{}\nTA00001,2024-03-01 00:00:00,24.5,60,2.0,180,0.0,880.1\nTA00001,2024-03-01 00:15:00,,61,NaN,190,0.2,880.0\n",
                HEADER
            ),
        );

        let readings = read_readings(&path).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].device_id, "TA00001");
        assert_eq!(readings[0].timestamp, "2024-03-01 00:00:00");
        assert_eq!(readings[0].measurements.air_temperature, Some(24.5));
        assert_eq!(readings[0].measurements.altitude, None);
        assert_eq!(readings[0].date, None);
        assert_eq!(readings[1].measurements.air_temperature, None);
        assert_eq!(readings[1].measurements.wind_speed, None);
        assert_eq!(readings[1].measurements.rain_gauge, Some(0.2));
    }

    #[test]
    fn test_optional_date_and_altitude() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            &format!(
                "{},date,altitude\nTA00001,2024-03-01 23:45:00,24.5,60,2.0,180,0.0,880.1,2024-03-01,1200\n",
                HEADER
            ),
        );

        let readings = read_readings(&path).unwrap();

        assert_eq!(readings[0].date.as_deref(), Some("2024-03-01"));
        assert_eq!(readings[0].measurements.altitude, Some(1200.0));
    }

    #[test]
    fn test_numeric_looking_station_ids_stay_distinct() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            &format!(
                "{}\n007,2024-03-01 00:00:00,24.5,60,2.0,180,0.0,880.1\n7,2024-03-01 00:00:00,25.0,61,2.1,185,0.0,880.2\n",
                HEADER
            ),
        );

        let readings = read_readings(&path).unwrap();

        assert_eq!(readings[0].device_id, "007");
        assert_eq!(readings[1].device_id, "7");
    }

    #[test]
    fn test_malformed_numeric_cell_becomes_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            &format!(
                "{}\nTA00001,2024-03-01 00:00:00,24.5,60,2.0,180,0.0,880.1\nTA00001,2024-03-01 00:15:00,err,61,2.0,190,0.2,880.0\n",
                HEADER
            ),
        );

        let readings = read_readings(&path).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].measurements.air_temperature, None);
        assert_eq!(readings[1].measurements.air_humidity, Some(61.0));
    }

    #[test]
    fn test_csv_schema_from_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            &format!("{},date,altitude\n", HEADER),
        );

        let schema = csv_schema(&path).unwrap();

        assert_eq!(schema.get(columns::DEVICE_ID), Some(&DataType::String));
        assert_eq!(schema.get(columns::DATE), Some(&DataType::String));
        assert_eq!(schema.get(columns::WIND_SPEED), Some(&DataType::Float64));
        assert_eq!(schema.get(columns::ALTITUDE), Some(&DataType::Float64));
    }

    #[test]
    fn test_missing_required_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            &temp_dir,
            "readings.csv",
            "device_id,processing_timestamp,air_temperature\nTA00001,2024-03-01 00:00:00,24.5\n",
        );

        match read_readings(&path).unwrap_err() {
            QcError::MissingColumn { column, .. } => assert_eq!(column, "air_humidity"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(&temp_dir, "readings.txt", HEADER);

        assert!(matches!(
            load_frame(&path),
            Err(QcError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_inputs_preserves_file_order() {
        let temp_dir = TempDir::new().unwrap();
        let first = write_csv(
            &temp_dir,
            "a.csv",
            &format!("{}\nTA00001,2024-03-01 00:00:00,20,60,2,180,0,880\n", HEADER),
        );
        let second = write_csv(
            &temp_dir,
            "b.csv",
            &format!("{}\nTA00001,2024-03-01 00:00:00,30,60,2,180,0,880\n", HEADER),
        );

        let readings = load_inputs(&[first, second], 2, None).await.unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].measurements.air_temperature, Some(20.0));
        assert_eq!(readings[1].measurements.air_temperature, Some(30.0));
    }
}
