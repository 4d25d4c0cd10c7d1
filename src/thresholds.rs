//! Threshold configuration for the Level-1 checks.
//!
//! Thresholds arrive as a flat mapping from parameter name to number. Every
//! key listed in [`Thresholds::KEYS`] must be present and numeric; a missing
//! or non-numeric key is a configuration error and aborts the run before any
//! reading is evaluated. Once built, a `Thresholds` value is never mutated and
//! is shared read-only by every rule.

use crate::error::{QcError, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Physical, climatological, step and accumulation limits for one station network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    // Air temperature (degC)
    #[serde(rename = "Tair_min_phy")]
    pub tair_min_phy: f64,
    #[serde(rename = "Tair_max_phy")]
    pub tair_max_phy: f64,
    #[serde(rename = "Tair_warn_min_clim")]
    pub tair_warn_min_clim: f64,
    #[serde(rename = "Tair_warn_max_clim")]
    pub tair_warn_max_clim: f64,
    #[serde(rename = "Tair_max_step_warn")]
    pub tair_max_step_warn: f64,
    #[serde(rename = "Tair_max_step_fail")]
    pub tair_max_step_fail: f64,

    // Relative humidity (%)
    #[serde(rename = "RH_min_phy")]
    pub rh_min_phy: f64,
    #[serde(rename = "RH_max_phy")]
    pub rh_max_phy: f64,
    #[serde(rename = "RH_warn_min_clim")]
    pub rh_warn_min_clim: f64,

    // Rain (mm)
    #[serde(rename = "Rain_min_inc")]
    pub rain_min_inc: f64,
    #[serde(rename = "Rain_warn_15min")]
    pub rain_warn_15min: f64,
    #[serde(rename = "Rain_max_15min")]
    pub rain_max_15min: f64,
    #[serde(rename = "Rain_warn_daily")]
    pub rain_warn_daily: f64,
    #[serde(rename = "Rain_max_daily")]
    pub rain_max_daily: f64,

    // Wind speed (m/s) and direction (deg)
    #[serde(rename = "Wind_min_phy")]
    pub wind_min_phy: f64,
    #[serde(rename = "Wind_warn_max_clim")]
    pub wind_warn_max_clim: f64,
    #[serde(rename = "Wind_max_phy")]
    pub wind_max_phy: f64,
    #[serde(rename = "WindDir_min_phy")]
    pub winddir_min_phy: f64,
    #[serde(rename = "WindDir_max_phy")]
    pub winddir_max_phy: f64,
    #[serde(rename = "WindDir_requires_wind")]
    pub winddir_requires_wind: f64,

    // Pressure (hPa)
    #[serde(rename = "P_min_phy")]
    pub p_min_phy: f64,
    #[serde(rename = "P_max_phy")]
    pub p_max_phy: f64,
    #[serde(rename = "P_warn_abs_dev")]
    pub p_warn_abs_dev: f64,
    #[serde(rename = "P_fail_abs_dev")]
    pub p_fail_abs_dev: f64,

    /// Minimum fraction of expected daily samples
    #[serde(rename = "Min_daily_avail")]
    pub min_daily_avail: f64,
}

impl Thresholds {
    /// Parameter names, as they appear in threshold files
    pub const KEYS: [&'static str; 25] = [
        "Tair_min_phy",
        "Tair_max_phy",
        "Tair_warn_min_clim",
        "Tair_warn_max_clim",
        "Tair_max_step_warn",
        "Tair_max_step_fail",
        "RH_min_phy",
        "RH_max_phy",
        "RH_warn_min_clim",
        "Rain_min_inc",
        "Rain_warn_15min",
        "Rain_max_15min",
        "Rain_warn_daily",
        "Rain_max_daily",
        "Wind_min_phy",
        "Wind_warn_max_clim",
        "Wind_max_phy",
        "WindDir_min_phy",
        "WindDir_max_phy",
        "WindDir_requires_wind",
        "P_min_phy",
        "P_max_phy",
        "P_warn_abs_dev",
        "P_fail_abs_dev",
        "Min_daily_avail",
    ];

    /// Reference thresholds for the Busia (western Kenya) station network
    pub fn busia() -> Self {
        Self {
            tair_min_phy: 10.0,
            tair_max_phy: 45.0,
            tair_warn_min_clim: 12.0,
            tair_warn_max_clim: 36.0,
            tair_max_step_warn: 3.0,
            tair_max_step_fail: 5.0,
            rh_min_phy: 0.0,
            rh_max_phy: 100.0,
            rh_warn_min_clim: 20.0,
            rain_min_inc: 0.0,
            rain_warn_15min: 20.0,
            rain_max_15min: 40.0,
            rain_warn_daily: 150.0,
            rain_max_daily: 300.0,
            wind_min_phy: 0.0,
            wind_warn_max_clim: 20.0,
            wind_max_phy: 40.0,
            winddir_min_phy: 0.0,
            winddir_max_phy: 360.0,
            winddir_requires_wind: 0.3,
            p_min_phy: 750.0,
            p_max_phy: 1010.0,
            p_warn_abs_dev: 25.0,
            p_fail_abs_dev: 40.0,
            min_daily_avail: 0.8,
        }
    }

    /// Build thresholds from a numeric mapping, requiring every key
    pub fn from_map(values: &HashMap<String, f64>) -> Result<Self> {
        let missing: Vec<&str> = Self::KEYS
            .iter()
            .copied()
            .filter(|key| !values.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(QcError::configuration(format!(
                "missing threshold(s): {}",
                missing.join(", ")
            )));
        }

        let get = |key: &str| values[key];
        let thresholds = Self {
            tair_min_phy: get("Tair_min_phy"),
            tair_max_phy: get("Tair_max_phy"),
            tair_warn_min_clim: get("Tair_warn_min_clim"),
            tair_warn_max_clim: get("Tair_warn_max_clim"),
            tair_max_step_warn: get("Tair_max_step_warn"),
            tair_max_step_fail: get("Tair_max_step_fail"),
            rh_min_phy: get("RH_min_phy"),
            rh_max_phy: get("RH_max_phy"),
            rh_warn_min_clim: get("RH_warn_min_clim"),
            rain_min_inc: get("Rain_min_inc"),
            rain_warn_15min: get("Rain_warn_15min"),
            rain_max_15min: get("Rain_max_15min"),
            rain_warn_daily: get("Rain_warn_daily"),
            rain_max_daily: get("Rain_max_daily"),
            wind_min_phy: get("Wind_min_phy"),
            wind_warn_max_clim: get("Wind_warn_max_clim"),
            wind_max_phy: get("Wind_max_phy"),
            winddir_min_phy: get("WindDir_min_phy"),
            winddir_max_phy: get("WindDir_max_phy"),
            winddir_requires_wind: get("WindDir_requires_wind"),
            p_min_phy: get("P_min_phy"),
            p_max_phy: get("P_max_phy"),
            p_warn_abs_dev: get("P_warn_abs_dev"),
            p_fail_abs_dev: get("P_fail_abs_dev"),
            min_daily_avail: get("Min_daily_avail"),
        };

        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Build thresholds from a TOML table, rejecting non-numeric values
    ///
    /// Unknown keys are ignored with a debug log so that threshold files can
    /// carry parameters for checks this engine does not run.
    pub fn from_toml_table(table: &toml::Table) -> Result<Self> {
        let mut values = HashMap::with_capacity(table.len());
        for (key, value) in table {
            if !Self::KEYS.contains(&key.as_str()) {
                debug!("Ignoring unknown threshold key '{}'", key);
                continue;
            }
            let number = match value {
                toml::Value::Float(f) => *f,
                toml::Value::Integer(i) => *i as f64,
                other => {
                    return Err(QcError::configuration(format!(
                        "threshold '{}' must be numeric, found {}",
                        key,
                        other.type_str()
                    )));
                }
            };
            values.insert(key.clone(), number);
        }
        Self::from_map(&values)
    }

    /// Name/value pairs in [`Thresholds::KEYS`] order
    pub fn to_pairs(&self) -> Vec<(&'static str, f64)> {
        let values = [
            self.tair_min_phy,
            self.tair_max_phy,
            self.tair_warn_min_clim,
            self.tair_warn_max_clim,
            self.tair_max_step_warn,
            self.tair_max_step_fail,
            self.rh_min_phy,
            self.rh_max_phy,
            self.rh_warn_min_clim,
            self.rain_min_inc,
            self.rain_warn_15min,
            self.rain_max_15min,
            self.rain_warn_daily,
            self.rain_max_daily,
            self.wind_min_phy,
            self.wind_warn_max_clim,
            self.wind_max_phy,
            self.winddir_min_phy,
            self.winddir_max_phy,
            self.winddir_requires_wind,
            self.p_min_phy,
            self.p_max_phy,
            self.p_warn_abs_dev,
            self.p_fail_abs_dev,
            self.min_daily_avail,
        ];
        Self::KEYS.into_iter().zip(values).collect()
    }

    /// Reject non-finite values and inverted bands
    pub fn validate(&self) -> Result<()> {
        if let Some((key, _)) = self.to_pairs().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(QcError::configuration(format!(
                "threshold '{}' must be a finite number",
                key
            )));
        }

        let bands = [
            ("Tair_min_phy", self.tair_min_phy, "Tair_max_phy", self.tair_max_phy),
            (
                "Tair_warn_min_clim",
                self.tair_warn_min_clim,
                "Tair_warn_max_clim",
                self.tair_warn_max_clim,
            ),
            (
                "Tair_max_step_warn",
                self.tair_max_step_warn,
                "Tair_max_step_fail",
                self.tair_max_step_fail,
            ),
            ("RH_min_phy", self.rh_min_phy, "RH_max_phy", self.rh_max_phy),
            (
                "Rain_warn_15min",
                self.rain_warn_15min,
                "Rain_max_15min",
                self.rain_max_15min,
            ),
            (
                "Rain_warn_daily",
                self.rain_warn_daily,
                "Rain_max_daily",
                self.rain_max_daily,
            ),
            ("Wind_min_phy", self.wind_min_phy, "Wind_max_phy", self.wind_max_phy),
            (
                "WindDir_min_phy",
                self.winddir_min_phy,
                "WindDir_max_phy",
                self.winddir_max_phy,
            ),
            ("P_min_phy", self.p_min_phy, "P_max_phy", self.p_max_phy),
            (
                "P_warn_abs_dev",
                self.p_warn_abs_dev,
                "P_fail_abs_dev",
                self.p_fail_abs_dev,
            ),
        ];

        for (low_key, low, high_key, high) in bands {
            if low > high {
                return Err(QcError::configuration(format!(
                    "threshold '{}' ({}) exceeds '{}' ({})",
                    low_key, low, high_key, high
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busia_map() -> HashMap<String, f64> {
        Thresholds::busia()
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_busia_round_trips_through_map() {
        let thresholds = Thresholds::from_map(&busia_map()).unwrap();
        assert_eq!(thresholds, Thresholds::busia());
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let mut values = busia_map();
        values.remove("Rain_max_daily");
        values.remove("Tair_min_phy");

        let err = Thresholds::from_map(&values).unwrap_err();
        assert!(err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("Rain_max_daily"));
        assert!(msg.contains("Tair_min_phy"));
    }

    #[test]
    fn test_non_numeric_toml_value_rejected() {
        let mut table: toml::Table = toml::from_str(
            &busia_map()
                .into_iter()
                .map(|(k, v)| format!("{k} = {v:?}"))
                .collect::<Vec<_>>()
                .join("\n"),
        )
        .unwrap();
        assert!(Thresholds::from_toml_table(&table).is_ok());

        table.insert(
            "Wind_max_phy".to_string(),
            toml::Value::String("forty".to_string()),
        );
        let err = Thresholds::from_toml_table(&table).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Wind_max_phy"));
    }

    #[test]
    fn test_integer_toml_values_accepted() {
        let mut table = toml::Table::new();
        for (key, value) in Thresholds::busia().to_pairs() {
            table.insert(key.to_string(), toml::Value::Float(value));
        }
        table.insert("RH_max_phy".to_string(), toml::Value::Integer(100));

        let thresholds = Thresholds::from_toml_table(&table).unwrap();
        assert_eq!(thresholds.rh_max_phy, 100.0);
    }

    #[test]
    fn test_unknown_keys_ignored_whatever_their_type() {
        let mut table = toml::Table::new();
        for (key, value) in Thresholds::busia().to_pairs() {
            table.insert(key.to_string(), toml::Value::Float(value));
        }
        table.insert(
            "Station_network".to_string(),
            toml::Value::String("busia".to_string()),
        );
        table.insert("Soil_max_phy".to_string(), toml::Value::Float(60.0));

        assert_eq!(
            Thresholds::from_toml_table(&table).unwrap(),
            Thresholds::busia()
        );
    }

    #[test]
    fn test_serialized_names_match_keys() {
        let text = toml::to_string(&Thresholds::busia()).unwrap();
        let table: toml::Table = toml::from_str(&text).unwrap();

        assert_eq!(table.len(), Thresholds::KEYS.len());
        for key in Thresholds::KEYS {
            assert!(table.contains_key(key), "missing {}", key);
        }
        assert_eq!(
            Thresholds::from_toml_table(&table).unwrap(),
            Thresholds::busia()
        );
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut values = busia_map();
        values.insert("Tair_min_phy".to_string(), 50.0);

        let err = Thresholds::from_map(&values).unwrap_err();
        assert!(err.to_string().contains("Tair_min_phy"));
    }
}
