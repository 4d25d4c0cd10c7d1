//! Configuration management and validation.
//!
//! Provides the engine settings (sampling cadence, gap window, optional
//! checks, parallelism) and the layered loader for TOML configuration files
//! carrying a `[settings]` table and a `[thresholds]` table.

use crate::constants::{
    DEFAULT_EXPECTED_SAMPLES_PER_DAY, DEFAULT_MAX_GAP_MINUTES, DEFAULT_MIN_GAP_MINUTES,
};
use crate::error::{QcError, Result};
use crate::thresholds::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Engine settings that are not physical thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcSettings {
    /// Samples in a complete day at the nominal interval
    pub expected_samples_per_day: u32,

    /// Smallest regular inter-sample gap in minutes (inclusive)
    pub min_gap_minutes: f64,

    /// Largest regular inter-sample gap in minutes (inclusive)
    pub max_gap_minutes: f64,

    /// Run the altitude-based pressure range check
    pub pressure_check: bool,

    /// Number of stations evaluated concurrently
    pub workers: usize,
}

impl Default for QcSettings {
    fn default() -> Self {
        Self {
            expected_samples_per_day: DEFAULT_EXPECTED_SAMPLES_PER_DAY,
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            max_gap_minutes: DEFAULT_MAX_GAP_MINUTES,
            pressure_check: false,
            workers: num_cpus::get(),
        }
    }
}

impl QcSettings {
    /// Create settings with a custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Create settings with a custom regular-gap window
    pub fn with_gap_window(mut self, min_minutes: f64, max_minutes: f64) -> Self {
        self.min_gap_minutes = min_minutes;
        self.max_gap_minutes = max_minutes;
        self
    }

    /// Create settings with a custom daily sample expectation
    pub fn with_expected_samples_per_day(mut self, samples: u32) -> Self {
        self.expected_samples_per_day = samples;
        self
    }

    /// Enable the pressure range check
    pub fn with_pressure_check(mut self) -> Self {
        self.pressure_check = true;
        self
    }

    /// Validate settings before any reading is evaluated
    pub fn validate(&self) -> Result<()> {
        if self.expected_samples_per_day == 0 {
            return Err(QcError::configuration(
                "expected_samples_per_day must be greater than zero",
            ));
        }

        if !self.min_gap_minutes.is_finite() || !self.max_gap_minutes.is_finite() {
            return Err(QcError::configuration("gap window must be finite"));
        }

        if self.min_gap_minutes > self.max_gap_minutes {
            return Err(QcError::configuration(format!(
                "min_gap_minutes ({}) exceeds max_gap_minutes ({})",
                self.min_gap_minutes, self.max_gap_minutes
            )));
        }

        if self.workers == 0 {
            return Err(QcError::configuration("workers must be at least 1"));
        }

        Ok(())
    }
}

/// Complete run configuration: settings plus thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct QcConfig {
    pub settings: QcSettings,
    pub thresholds: Thresholds,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            settings: QcSettings::default(),
            thresholds: Thresholds::busia(),
        }
    }
}

impl QcConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!("Loaded configuration file {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text
    ///
    /// The `[thresholds]` table is mandatory and must be complete; the
    /// `[settings]` table is optional and falls back to defaults per field.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut document: toml::Table = toml::from_str(text)?;

        let settings = match document.remove("settings") {
            Some(value) => value.try_into::<QcSettings>()?,
            None => QcSettings::default(),
        };
        settings.validate()?;

        let thresholds = match document.remove("thresholds") {
            Some(toml::Value::Table(table)) => Thresholds::from_toml_table(&table)?,
            Some(other) => {
                return Err(QcError::configuration(format!(
                    "[thresholds] must be a table, found {}",
                    other.type_str()
                )));
            }
            None => {
                return Err(QcError::configuration(
                    "configuration file has no [thresholds] table",
                ));
            }
        };

        Ok(Self {
            settings,
            thresholds,
        })
    }

    /// Render the configuration as TOML readable by [`QcConfig::from_toml_str`]
    pub fn to_toml_string(&self) -> Result<String> {
        let document = ConfigDocument {
            settings: &self.settings,
            thresholds: &self.thresholds,
        };
        Ok(toml::to_string(&document)?)
    }
}

/// On-disk layout of a configuration file
#[derive(Serialize)]
struct ConfigDocument<'a> {
    settings: &'a QcSettings,
    thresholds: &'a Thresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = QcSettings::default();
        assert_eq!(settings.expected_samples_per_day, 96);
        assert_eq!(settings.min_gap_minutes, 14.0);
        assert_eq!(settings.max_gap_minutes, 16.0);
        assert!(!settings.pressure_check);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let zero_samples = QcSettings::default().with_expected_samples_per_day(0);
        assert!(zero_samples.validate().unwrap_err().is_configuration());

        let inverted = QcSettings::default().with_gap_window(20.0, 10.0);
        assert!(inverted.validate().is_err());

        let no_workers = QcSettings::default().with_workers(0);
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = QcConfig {
            settings: QcSettings::default()
                .with_workers(2)
                .with_pressure_check(),
            thresholds: Thresholds::busia(),
        };

        let parsed = QcConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rendered_document_layout() {
        let text = QcConfig::default().to_toml_string().unwrap();
        let document: toml::Table = toml::from_str(&text).unwrap();

        let settings = document["settings"].as_table().unwrap();
        assert_eq!(settings["expected_samples_per_day"].as_integer(), Some(96));
        assert_eq!(settings["pressure_check"].as_bool(), Some(false));

        let thresholds = document["thresholds"].as_table().unwrap();
        assert_eq!(thresholds["Tair_max_phy"].as_float(), Some(45.0));
        assert_eq!(thresholds["Min_daily_avail"].as_float(), Some(0.8));
    }

    #[test]
    fn test_settings_table_optional() {
        let mut text = String::from("[thresholds]\n");
        for (key, value) in Thresholds::busia().to_pairs() {
            text.push_str(&format!("{key} = {value:?}\n"));
        }

        let config = QcConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.settings.expected_samples_per_day, 96);
        assert_eq!(config.thresholds, Thresholds::busia());
    }

    #[test]
    fn test_missing_thresholds_table_rejected() {
        let err = QcConfig::from_toml_str("[settings]\nworkers = 2\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let mut text = String::from("[settings]\nmin_gap_minutes = 9.0\nmax_gap_minutes = 11\n");
        text.push_str("\n[thresholds]\n");
        for (key, value) in Thresholds::busia().to_pairs() {
            text.push_str(&format!("{key} = {value:?}\n"));
        }

        let config = QcConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.settings.min_gap_minutes, 9.0);
        assert_eq!(config.settings.max_gap_minutes, 11.0);
        assert_eq!(config.settings.expected_samples_per_day, 96);
    }
}
