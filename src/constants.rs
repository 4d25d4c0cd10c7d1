//! Application constants for the station QC engine
//!
//! This module contains rule names, verdict codes, physical constants,
//! input column names and default values used throughout the crate.

// =============================================================================
// Verdict Codes
// =============================================================================

/// Numeric verdict codes written to output files.
///
/// These follow the encoding used by the field-station QC feed so that
/// downstream consumers reading the codes directly keep working.
pub mod codes {
    /// Three-level severity: failed the check
    pub const FAIL: i32 = -2;

    /// Three-level severity: suspect value
    pub const WARNING: i32 = 0;

    /// Three-level severity: passed (also the default)
    pub const OK: i32 = 1;

    /// Binary time-gap check: gap within the nominal window (or undefined)
    pub const GAP_REGULAR: i32 = 0;

    /// Binary time-gap check: gap outside the nominal window
    pub const GAP_IRREGULAR: i32 = -1;

    /// Binary gates (wind-direction gate, daily availability): condition met
    pub const GATE_OPEN: i32 = 1;

    /// Binary gates: condition not met
    pub const GATE_CLOSED: i32 = 0;
}

// =============================================================================
// Physical Constants
// =============================================================================

/// Median pressure above which the whole dataset is assumed to be in pascals
pub const PASCAL_MEDIAN_THRESHOLD: f64 = 2000.0;

/// Pascal to hectopascal divisor
pub const PASCALS_PER_HECTOPASCAL: f64 = 100.0;

/// Standard sea-level pressure in hPa used for the expected-pressure model
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Scale height in metres for the barometric expected-pressure model
pub const PRESSURE_SCALE_HEIGHT_M: f64 = 8434.0;

// =============================================================================
// Processing Defaults
// =============================================================================

/// Nominal sampling interval in minutes
pub const NOMINAL_INTERVAL_MINUTES: u32 = 15;

/// Expected samples for a full day at the nominal interval (24h / 15 min)
pub const DEFAULT_EXPECTED_SAMPLES_PER_DAY: u32 = 24 * 60 / NOMINAL_INTERVAL_MINUTES;

/// Lower bound (inclusive) of a regular inter-sample gap in minutes
pub const DEFAULT_MIN_GAP_MINUTES: f64 = 14.0;

/// Upper bound (inclusive) of a regular inter-sample gap in minutes
pub const DEFAULT_MAX_GAP_MINUTES: f64 = 16.0;

// =============================================================================
// Input / Output Columns
// =============================================================================

/// Column names of the station feed (input) and of the enriched output
pub mod columns {
    pub const DEVICE_ID: &str = "device_id";
    pub const TIMESTAMP: &str = "processing_timestamp";
    pub const DATE: &str = "date";
    pub const AIR_TEMPERATURE: &str = "air_temperature";
    pub const AIR_HUMIDITY: &str = "air_humidity";
    pub const WIND_SPEED: &str = "wind_speed";
    pub const WIND_DIRECTION: &str = "wind_direction_sensor";
    pub const RAIN_GAUGE: &str = "rain_gauge";
    pub const BAROMETRIC_PRESSURE: &str = "barometric_pressure";
    pub const ALTITUDE: &str = "altitude";

    /// Input columns read as Float64; everything else stays text
    pub const NUMERIC: &[&str] = &[
        AIR_TEMPERATURE,
        AIR_HUMIDITY,
        WIND_SPEED,
        WIND_DIRECTION,
        RAIN_GAUGE,
        BAROMETRIC_PRESSURE,
        ALTITUDE,
    ];

    // Derived
    pub const PRESSURE_HPA: &str = "pressure_hpa";
    pub const TIME_DIFF: &str = "time_diff";
    pub const TAIR_STEP: &str = "tair_step";
    pub const EXPECTED_PRESSURE_HPA: &str = "p_expected_hpa";
    pub const PRESSURE_ABS_DEV_HPA: &str = "pressure_abs_dev_hpa";
    pub const DAILY_VALID_FRAC: &str = "daily_valid_frac";
    pub const DAILY_RAIN_MM: &str = "daily_rain_mm";
    pub const FAILED_CHECKS: &str = "qc_failed_checks";
    pub const WARNING_CHECKS: &str = "qc_warning_checks";

    /// Columns every input file must carry
    pub const REQUIRED: &[&str] = &[
        DEVICE_ID,
        TIMESTAMP,
        AIR_TEMPERATURE,
        AIR_HUMIDITY,
        WIND_SPEED,
        WIND_DIRECTION,
        RAIN_GAUGE,
        BAROMETRIC_PRESSURE,
    ];
}

/// Timestamp layouts accepted for the text timestamp column, tried in order
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date layout for the optional date column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp layout written to output files
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator for rollup name lists in flat (CSV) output
pub const CHECK_LIST_SEPARATOR: &str = ";";
