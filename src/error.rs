//! Error handling for station quality-control runs.
//!
//! Configuration problems are fatal and surface before any rule is
//! evaluated. Per-record defects (unparseable timestamps or dates) are not
//! errors at this level: the engine routes them to the rejected list instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid TOML in configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to render configuration as TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported input format for file: {path} (expected .csv or .parquet)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Required column '{column}' missing from {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Malformed timestamp '{value}' for station '{station}'")]
    MalformedTimestamp { station: String, value: String },

    #[error("Malformed date '{value}' for station '{station}'")]
    MalformedDate { station: String, value: String },

    #[error("Evaluation failed for station '{station}': {reason}")]
    Evaluation { station: String, reason: String },
}

impl QcError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for errors that must abort the run before any rule evaluates
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Toml(_))
    }
}

pub type Result<T> = std::result::Result<T, QcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = QcError::configuration("missing threshold 'Tair_min_phy'");
        let msg = format!("{}", err);
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("Tair_min_phy"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_timestamp_display() {
        let err = QcError::MalformedTimestamp {
            station: "TA00123".to_string(),
            value: "yesterday".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("'yesterday'"));
        assert!(msg.contains("TA00123"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_missing_column_display() {
        let err = QcError::MissingColumn {
            path: PathBuf::from("/data/busia.csv"),
            column: "rain_gauge".to_string(),
        };
        assert!(format!("{}", err).contains("'rain_gauge'"));
    }
}
