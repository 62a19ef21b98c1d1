//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sync.interval_secs must be at least 1")]
    ZeroInterval,
    #[error("sync.io_timeout_ms must be at least 1")]
    ZeroTimeout,
}

impl Config {
    /// See [`validate`].
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validate(self)
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sync.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if config.sync.io_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = Config::default();
        config.sync.interval_secs = 0;
        config.sync.io_timeout_ms = 0;

        assert_eq!(
            validate(&config).unwrap_err(),
            vec![ValidationError::ZeroInterval, ValidationError::ZeroTimeout]
        );
    }
}
