//! Temporal features derived from each station's previous reading.
//!
//! Both features need one sequential pass over a single station in time
//! order. The first reading of a station has no predecessor and gets `None`,
//! never zero.

use crate::models::Reading;

/// Minutes elapsed since the previous reading of the same station.
///
/// `readings` must be one station's series in ascending time order. Sub-second
/// parts are truncated before differencing.
pub fn time_gap_minutes(readings: &[Reading]) -> Vec<Option<f64>> {
    lagged(readings, |previous, current| {
        let seconds =
            current.timestamp.and_utc().timestamp() - previous.timestamp.and_utc().timestamp();
        Some(seconds as f64 / 60.0)
    })
}

/// Air temperature change since the previous reading of the same station.
///
/// Undefined when either temperature is missing.
pub fn temperature_step(readings: &[Reading]) -> Vec<Option<f64>> {
    lagged(readings, |previous, current| {
        match (
            previous.measurements.air_temperature,
            current.measurements.air_temperature,
        ) {
            (Some(before), Some(now)) => Some(now - before),
            _ => None,
        }
    })
}

fn lagged<F>(readings: &[Reading], diff: F) -> Vec<Option<f64>>
where
    F: Fn(&Reading, &Reading) -> Option<f64>,
{
    if readings.is_empty() {
        return Vec::new();
    }

    std::iter::once(None)
        .chain(readings.windows(2).map(|pair| diff(&pair[0], &pair[1])))
        .collect()
}
