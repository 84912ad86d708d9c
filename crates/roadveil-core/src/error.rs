//! Error types for the roadveil privacy filter.
//!
//! Suppression outcomes are *not* errors: a BSM failing the speed or geofence
//! test is reported through [`crate::types::Verdict`]. The types here cover
//! construction-time failures only: bad configuration and unusable map data.

use std::io;
use thiserror::Error;

/// Result type alias using [`RoadveilError`] as the error type.
pub type Result<T> = std::result::Result<T, RoadveilError>;

/// Top-level error type for roadveil construction and loading.
#[derive(Debug, Error)]
pub enum RoadveilError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Road-segment map errors
    #[error("Map error: {0}")]
    Map(#[from] MapError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while loading or interpreting the property-map configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// A configured value could not be interpreted
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    /// Creates a load failed error.
    pub fn load_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading the road-segment map file.
#[derive(Debug, Error)]
pub enum MapError {
    /// Failed to read the map file
    #[error("Failed to load map from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// The file parsed but produced no usable edges
    #[error("Map file {path} contains no usable edge records")]
    NoUsableRecords { path: String },

    /// A single record could not be interpreted
    #[error("Invalid edge record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

impl MapError {
    /// Creates a load failed error.
    pub fn load_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid_value("privacy.filter.velocity.min", "not a number");
        let text = err.to_string();
        assert!(text.contains("privacy.filter.velocity.min"));
        assert!(text.contains("not a number"));
    }

    #[test]
    fn test_map_error_conversion() {
        let err: RoadveilError = MapError::invalid_record(7, "bad geometry").into();
        assert!(matches!(err, RoadveilError::Map(_)));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: RoadveilError = io_err.into();
        assert!(matches!(err, RoadveilError::Io(_)));
    }
}
