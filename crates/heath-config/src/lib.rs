#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for Heath.
//!
//! # Usage
//!
//! ```rust,no_run
//! use heath_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("storing blocks in {}", resolved.config.store.path.display());
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`HEATH_DRIVER`, `HEATH_LOG_PATH`,
//!    `HEATH_SIGNING_KEY`, `HEATH_LOG_LEVEL`, `HEATH_LOG_DIR`)
//! 2. **Config file** (explicit path, `HEATH_CONFIG`, or `./heath.toml`)
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate depends on no other heath crate. Turning config values into
//! drivers and subscribers happens in the crates that own those types.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// `explicit` names the config file, taking priority over `HEATH_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit)
    }

    /// Render as TOML, as it would appear in a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if a value cannot be encoded.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_toml_reparses() {
        let mut config = Config::default();
        config.logging.directives = vec!["heath_db=debug".to_owned()];
        config.logging.file = Some(LogFileSection {
            rotation: "hourly".to_owned(),
            ..LogFileSection::default()
        });

        let rendered = config.to_toml().unwrap();
        let back: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(back, config);
    }
}
