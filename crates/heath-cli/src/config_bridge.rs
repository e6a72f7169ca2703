//! Bridge from `heath_config` sections to the types that consume them.

use heath_config::LoggingSection;
use heath_telemetry::{FileRotation, LogConfig, LogFormat};

/// Build the subscriber config for a `[logging]` section.
///
/// Formats and rotations are validated when the config loads, so an unknown
/// one can only come from a hand-built section and falls back to the default.
pub(crate) fn to_log_config(section: &LoggingSection) -> LogConfig {
    let format = section.format.parse().unwrap_or(LogFormat::Compact);
    let mut config = LogConfig::new(section.level.clone()).with_format(format);
    for directive in &section.directives {
        config = config.with_directive(directive.clone());
    }
    if let Some(file) = &section.file {
        let rotation = file.rotation.parse().unwrap_or(FileRotation::Daily);
        config = config.with_file_logging(file.directory.clone(), file.prefix.clone(), rotation);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use heath_config::LogFileSection;
    use heath_telemetry::LogTarget;
    use std::path::PathBuf;

    #[test]
    fn test_section_maps_onto_log_config() {
        let section = LoggingSection {
            level: "warn".to_owned(),
            format: "json".to_owned(),
            directives: vec!["heath_db=debug".to_owned()],
            file: None,
        };

        let config = to_log_config(&section);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["heath_db=debug"]);
        assert_eq!(config.target, LogTarget::Stderr);
    }

    #[test]
    fn test_file_section_selects_rotating_files() {
        let section = LoggingSection {
            file: Some(LogFileSection {
                directory: PathBuf::from("/var/log/heath"),
                prefix: "chain".to_owned(),
                rotation: "hourly".to_owned(),
            }),
            ..LoggingSection::default()
        };

        let config = to_log_config(&section);
        assert_eq!(config.target, LogTarget::File(PathBuf::from("/var/log/heath")));
        assert_eq!(config.file.prefix, "chain");
        assert_eq!(config.file.rotation, FileRotation::Hourly);
        assert!(!config.ansi);
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let section = LoggingSection {
            format: "xml".to_owned(),
            ..LoggingSection::default()
        };
        assert_eq!(to_log_config(&section).format, LogFormat::Compact);
    }
}
