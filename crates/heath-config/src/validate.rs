//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted `store.stream_buffer`.
pub const MAX_STREAM_BUFFER: usize = 65_536;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];
const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "minutely", "never"];

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_store(config)?;
    validate_keys(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_store(config: &Config) -> ConfigResult<()> {
    let store = &config.store;

    if store.driver.trim().is_empty() {
        return Err(invalid("store.driver", "driver name must not be empty"));
    }
    if store.path.as_os_str().is_empty() {
        return Err(invalid("store.path", "log path must not be empty"));
    }
    if !(1..=MAX_STREAM_BUFFER).contains(&store.stream_buffer) {
        return Err(invalid(
            "store.stream_buffer",
            format!(
                "{} is out of range; must be between 1 and {MAX_STREAM_BUFFER}",
                store.stream_buffer
            ),
        ));
    }
    Ok(())
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    if config.keys.signing_key.as_os_str().is_empty() {
        return Err(invalid("keys.signing_key", "key path must not be empty"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;

    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&logging.format.to_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    if let Some(file) = &logging.file {
        if file.directory.as_os_str().is_empty() {
            return Err(invalid(
                "logging.file.directory",
                "log directory must not be empty",
            ));
        }
        if file.prefix.trim().is_empty() {
            return Err(invalid("logging.file.prefix", "file prefix must not be empty"));
        }
        if !LOG_ROTATIONS.contains(&file.rotation.to_lowercase().as_str()) {
            return Err(invalid(
                "logging.file.rotation",
                format!(
                    "unknown rotation '{}'; expected one of: {}",
                    file.rotation,
                    LOG_ROTATIONS.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_stream_buffer_bounds() {
        for bad in [0, MAX_STREAM_BUFFER + 1] {
            let mut config = Config::default();
            config.store.stream_buffer = bad;
            let err = validate(&config).unwrap_err();
            assert!(
                matches!(&err, ConfigError::ValidationError { field, .. } if field == "store.stream_buffer")
            );
        }

        let mut config = Config::default();
        config.store.stream_buffer = MAX_STREAM_BUFFER;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert!(validate(&config).is_err());

        config.logging.format = "JSON".to_owned();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_log_file_section() {
        let mut config = Config::default();
        config.logging.file = Some(crate::LogFileSection::default());
        assert!(validate(&config).is_ok());

        if let Some(file) = config.logging.file.as_mut() {
            file.rotation = "weekly".to_owned();
        }
        let err = validate(&config).unwrap_err();
        assert!(
            matches!(&err, ConfigError::ValidationError { field, .. } if field == "logging.file.rotation")
        );
    }

    #[test]
    fn test_empty_paths_rejected() {
        let mut config = Config::default();
        config.keys.signing_key = std::path::PathBuf::new();
        assert!(validate(&config).is_err());
    }
}
