//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - required field missing
    #[error("[{section}] is missing required field '{field}'")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("[{section}] has invalid {field}: {message}")]
    InvalidValue {
        section: &'static str,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(section: &'static str, field: &'static str) -> Self {
        Self::MissingField { section, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("server", "address");
        assert_eq!(err.to_string(), "[server] is missing required field 'address'");
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("broker", "queue_capacity", "must be greater than 0");
        assert!(err.to_string().contains("[broker]"));
        assert!(err.to_string().contains("queue_capacity"));
        assert!(err.to_string().contains("must be greater than 0"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ConfigError::IoError {
            path: "/etc/logwire.toml".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/etc/logwire.toml"));
    }
}
