//! Per-reading Level-1 checks.
//!
//! Every rule is a pure function of one reading, its derived features and
//! the shared thresholds. None of them depend on other rows, so they can be
//! evaluated in any order once the temporal features exist.

use super::severity::{
    above, all_of, any_of, at_most, below, between, evaluate, outside, Condition,
};
use crate::config::QcSettings;
use crate::constants::{PRESSURE_SCALE_HEIGHT_M, SEA_LEVEL_PRESSURE_HPA};
use crate::models::{DerivedFeatures, Reading, Severity, TimeGapFlag, WindGate};
use crate::thresholds::Thresholds;

/// Air temperature against climatological and physical bands
pub fn temperature_range(reading: &Reading, thr: &Thresholds) -> Severity {
    let t = reading.measurements.air_temperature;
    evaluate(
        between(t, thr.tair_warn_min_clim, thr.tair_warn_max_clim),
        Some(between(t, thr.tair_min_phy, thr.tair_max_phy)),
        Some(outside(t, thr.tair_min_phy, thr.tair_max_phy)),
    )
}

/// Relative humidity against climatological and physical bands
pub fn humidity_range(reading: &Reading, thr: &Thresholds) -> Severity {
    let rh = reading.measurements.air_humidity;
    evaluate(
        between(rh, thr.rh_warn_min_clim, thr.rh_max_phy),
        Some(between(rh, thr.rh_min_phy, thr.rh_max_phy)),
        Some(outside(rh, thr.rh_min_phy, thr.rh_max_phy)),
    )
}

/// Wind speed against climatological and physical bands
pub fn wind_speed_range(reading: &Reading, thr: &Thresholds) -> Severity {
    let ws = reading.measurements.wind_speed;
    evaluate(
        between(ws, thr.wind_min_phy, thr.wind_warn_max_clim),
        Some(between(ws, thr.wind_min_phy, thr.wind_max_phy)),
        Some(outside(ws, thr.wind_min_phy, thr.wind_max_phy)),
    )
}

/// Wind direction within the compass range. There is no warning tier.
pub fn wind_direction_range(reading: &Reading, thr: &Thresholds) -> Severity {
    let wd = reading.measurements.wind_direction;
    evaluate(
        between(wd, thr.winddir_min_phy, thr.winddir_max_phy),
        None,
        Some(outside(wd, thr.winddir_min_phy, thr.winddir_max_phy)),
    )
}

/// Whether the wind is strong enough for the direction reading to mean anything.
///
/// Calm only when the speed is known and below the threshold.
pub fn wind_direction_requires_wind(reading: &Reading, thr: &Thresholds) -> WindGate {
    match below(reading.measurements.wind_speed, thr.winddir_requires_wind) {
        Some(true) => WindGate::Calm,
        _ => WindGate::Windy,
    }
}

/// 15-minute rain increment against the warning and maximum limits
pub fn rain_15min(reading: &Reading, thr: &Thresholds) -> Severity {
    let rain = reading.measurements.rain_gauge;
    evaluate(
        at_most(rain, thr.rain_warn_15min),
        Some(all_of(&[
            above(rain, thr.rain_warn_15min),
            at_most(rain, thr.rain_max_15min),
        ])),
        Some(any_of(&[
            below(rain, thr.rain_min_inc),
            above(rain, thr.rain_max_15min),
        ])),
    )
}

/// Absolute temperature step against the warning and failure deltas
pub fn temperature_step(features: &DerivedFeatures, thr: &Thresholds) -> Severity {
    let step = features.tair_step.map(f64::abs);
    evaluate(
        at_most(step, thr.tair_max_step_warn),
        Some(at_most(step, thr.tair_max_step_fail)),
        Some(above(step, thr.tair_max_step_fail)),
    )
}

/// Binary inter-sample gap check. An undefined gap is regular.
pub fn time_gap(features: &DerivedFeatures, settings: &QcSettings) -> TimeGapFlag {
    let regular: Condition = between(
        features.time_diff_minutes,
        settings.min_gap_minutes,
        settings.max_gap_minutes,
    );
    match regular {
        Some(false) => TimeGapFlag::Irregular,
        _ => TimeGapFlag::Regular,
    }
}

/// Expected station pressure in hPa from altitude; missing altitude counts as sea level
pub fn expected_pressure_hpa(altitude: Option<f64>) -> f64 {
    SEA_LEVEL_PRESSURE_HPA * (-altitude.unwrap_or(0.0) / PRESSURE_SCALE_HEIGHT_M).exp()
}

/// Expected pressure and absolute deviation of the normalized pressure from it
pub fn pressure_deviation(reading: &Reading) -> (f64, Option<f64>) {
    let expected = expected_pressure_hpa(reading.measurements.altitude);
    let deviation = reading.pressure_hpa.map(|p| (p - expected).abs());
    (expected, deviation)
}

/// Normalized pressure against physical limits and altitude-based expectation
pub fn pressure_range(reading: &Reading, features: &DerivedFeatures, thr: &Thresholds) -> Severity {
    let dev = features.pressure_abs_dev_hpa;
    evaluate(
        below(dev, thr.p_warn_abs_dev),
        Some(below(dev, thr.p_fail_abs_dev)),
        Some(any_of(&[
            outside(reading.pressure_hpa, thr.p_min_phy, thr.p_max_phy),
            above(dev, thr.p_fail_abs_dev),
        ])),
    )
}
