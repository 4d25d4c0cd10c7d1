//! Quality-rule evaluation engine for weather station readings.
//!
//! This module turns a loaded collection of raw readings into verdict
//! records: every retained reading enriched with derived features, one
//! verdict per rule, and the failed / warning rule-name rollups.
//!
//! # Architecture
//!
//! - [`normalize`] - timestamp parsing, dedup + per-station ordering, rain clamp, pressure units
//! - [`temporal`] - inter-sample gap and temperature step per station
//! - [`severity`] - the shared Fail > Warning > Ok encoder
//! - [`rules`] - the per-reading range, step and gap checks
//! - [`daily`] - per station-day reduction, broadcast join and daily checks
//! - [`rollup`] - failed / warning name lists
//! - [`stats`] - run statistics and the outcome structure
//!
//! # Processing Pipeline
//!
//! 1. **Normalize**: parse timestamps (rejecting malformed records), partition by
//!    station in time order without duplicates, clamp negative rain, detect
//!    pressure units over the whole dataset
//! 2. **Per station** (independent, may run concurrently): temporal features,
//!    per-reading rules, daily reduction and join, daily checks, rollup
//! 3. **Merge**: concatenate station results in station order and tally statistics
//!
//! # Example Usage
//!
//! ```rust
//! use station_qc::config::QcSettings;
//! use station_qc::engine::QcEngine;
//! use station_qc::models::{Measurements, RawReading};
//! use station_qc::thresholds::Thresholds;
//!
//! # fn example() -> station_qc::error::Result<()> {
//! let engine = QcEngine::new(Thresholds::busia(), QcSettings::default())?;
//!
//! let reading = RawReading::new("TA00001", "2024-03-01 00:00:00").with_measurements(Measurements {
//!     air_temperature: Some(24.5),
//!     ..Default::default()
//! });
//!
//! let outcome = engine.evaluate(vec![reading]);
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

pub mod daily;
pub mod normalize;
pub mod rollup;
pub mod rules;
pub mod severity;
pub mod stats;
pub mod temporal;

#[cfg(test)]
pub mod tests;

pub use stats::{QcOutcome, QcStats};

use crate::config::{QcConfig, QcSettings};
use crate::error::{QcError, Result};
use crate::models::{
    DailyAggregate, DerivedFeatures, RawReading, Reading, RejectedReading, RuleVerdicts,
    StationSeries, VerdictRecord,
};
use crate::thresholds::Thresholds;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

/// Readings after normalization, partitioned by station
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    /// One series per station, ascending station identifier
    pub stations: Vec<StationSeries>,
    /// Readings excluded during parsing
    pub rejected: Vec<RejectedReading>,
    /// Statistics gathered so far
    pub stats: QcStats,
}

/// Level-1 quality-control engine
///
/// Holds the immutable thresholds and settings for a run. Cloning is cheap
/// and shares the thresholds.
#[derive(Debug, Clone)]
pub struct QcEngine {
    thresholds: Arc<Thresholds>,
    settings: QcSettings,
}

impl QcEngine {
    /// Create an engine, validating thresholds and settings up front
    pub fn new(thresholds: Thresholds, settings: QcSettings) -> Result<Self> {
        thresholds.validate()?;
        settings.validate()?;
        Ok(Self {
            thresholds: Arc::new(thresholds),
            settings,
        })
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: QcConfig) -> Result<Self> {
        Self::new(config.thresholds, config.settings)
    }

    /// Get the thresholds used by this engine
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Get the settings used by this engine
    pub fn settings(&self) -> &QcSettings {
        &self.settings
    }

    /// Evaluate a batch of raw readings sequentially
    pub fn evaluate(&self, raw: Vec<RawReading>) -> QcOutcome {
        let PreparedBatch {
            stations,
            rejected,
            stats,
        } = self.prepare(raw);

        let per_station = stations
            .into_iter()
            .map(|series| self.evaluate_station(series))
            .collect();

        Self::finish(stats, rejected, per_station)
    }

    /// Evaluate a batch with stations spread over the blocking thread pool.
    ///
    /// At most `settings.workers` stations are in flight at once. Results are
    /// merged in station order, so the outcome is identical to
    /// [`QcEngine::evaluate`]. A station whose evaluation panics fails the
    /// whole batch.
    pub async fn evaluate_concurrent(
        &self,
        raw: Vec<RawReading>,
        progress_bar: Option<&ProgressBar>,
    ) -> Result<QcOutcome> {
        let PreparedBatch {
            stations,
            rejected,
            stats,
        } = self.prepare(raw);

        if let Some(pb) = progress_bar {
            pb.set_length(stations.len() as u64);
        }

        let results: Vec<Result<Vec<VerdictRecord>>> = stream::iter(stations)
            .map(|series| {
                let engine = self.clone();
                let pb = progress_bar.cloned();
                async move {
                    let device_id = series.device_id.clone();
                    let records = task::spawn_blocking(move || engine.evaluate_station(series))
                        .await
                        .map_err(|e| QcError::Evaluation {
                            station: device_id.clone(),
                            reason: e.to_string(),
                        })?;

                    if let Some(pb) = pb {
                        pb.set_message(format!("Station {}", device_id));
                        pb.inc(1);
                    }
                    Ok::<_, QcError>(records)
                }
            })
            .buffered(self.settings.workers)
            .collect()
            .await;

        let per_station = results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(Self::finish(stats, rejected, per_station))
    }

    /// Normalize raw readings into per-station series
    pub fn prepare(&self, raw: Vec<RawReading>) -> PreparedBatch {
        let mut stats = QcStats::new();
        stats.total_input = raw.len();

        info!("Starting quality control for {} readings", raw.len());

        let (readings, rejected) = normalize::parse_timestamps(raw);
        stats.rejected = rejected.len();

        let (mut stations, duplicates_removed) = normalize::dedup_and_order(readings);
        stats.duplicates_removed = duplicates_removed;

        stats.rain_clamped = stations
            .iter_mut()
            .map(|s| normalize::clamp_rain(&mut s.readings))
            .sum();
        if stats.rain_clamped > 0 {
            debug!(
                "Clamped {} negative rain increments to zero",
                stats.rain_clamped
            );
        }

        let scaling = normalize::normalize_pressure_units(&mut stations);
        stats.pressure_median = scaling.median;
        stats.pressure_rescaled = scaling.rescaled;
        stats.stations = stations.len();

        PreparedBatch {
            stations,
            rejected,
            stats,
        }
    }

    /// Run temporal features, rules, daily aggregation and rollup for one station
    pub fn evaluate_station(&self, series: StationSeries) -> Vec<VerdictRecord> {
        if series.is_empty() {
            return Vec::new();
        }

        let (gaps, steps, days) = {
            let readings = &series.readings;
            let aggregates =
                daily::daily_stats(readings, self.settings.expected_samples_per_day);
            (
                temporal::time_gap_minutes(readings),
                temporal::temperature_step(readings),
                daily::join_daily(readings, &aggregates),
            )
        };

        debug!(
            "Evaluating station {} ({} readings)",
            series.device_id,
            series.len()
        );

        series
            .readings
            .into_iter()
            .zip(gaps)
            .zip(steps)
            .zip(days)
            .map(|(((reading, gap), step), daily)| self.evaluate_reading(reading, gap, step, daily))
            .collect()
    }

    fn evaluate_reading(
        &self,
        reading: Reading,
        time_diff_minutes: Option<f64>,
        tair_step: Option<f64>,
        daily: DailyAggregate,
    ) -> VerdictRecord {
        let thr = self.thresholds.as_ref();
        let (expected_pressure, deviation) = rules::pressure_deviation(&reading);
        let features = DerivedFeatures {
            time_diff_minutes,
            tair_step,
            expected_pressure_hpa: Some(expected_pressure),
            pressure_abs_dev_hpa: deviation,
        };

        let verdicts = RuleVerdicts {
            time_gap: rules::time_gap(&features, &self.settings),
            tair_range: rules::temperature_range(&reading, thr),
            rh_range: rules::humidity_range(&reading, thr),
            wind_speed_range: rules::wind_speed_range(&reading, thr),
            wind_dir_range: rules::wind_direction_range(&reading, thr),
            wind_dir_requires_wind: rules::wind_direction_requires_wind(&reading, thr),
            rain_15min: rules::rain_15min(&reading, thr),
            tair_step: rules::temperature_step(&features, thr),
            daily_availability: daily::availability_check(&daily, thr),
            rain_daily: daily::daily_rain_check(&daily, thr),
            pressure_range: self
                .settings
                .pressure_check
                .then(|| rules::pressure_range(&reading, &features, thr)),
        };

        let (failed_checks, warning_checks) = rollup::collect(&verdicts);

        VerdictRecord {
            reading,
            features,
            daily,
            verdicts,
            failed_checks,
            warning_checks,
        }
    }

    fn finish(
        mut stats: QcStats,
        rejected: Vec<RejectedReading>,
        per_station: Vec<Vec<VerdictRecord>>,
    ) -> QcOutcome {
        let records: Vec<VerdictRecord> = per_station.into_iter().flatten().collect();

        stats.station_days = records
            .iter()
            .map(|r| (r.reading.device_id.as_str(), r.reading.date))
            .collect::<HashSet<_>>()
            .len();
        for record in &records {
            stats.record(record);
        }

        info!("{}", stats.summary());

        QcOutcome {
            records,
            rejected,
            stats,
        }
    }
}
