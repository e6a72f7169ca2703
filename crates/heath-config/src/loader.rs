//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the config file: the explicit path, else `HEATH_CONFIG`, else
//!    `./heath.toml` if it exists
//! 3. Apply `HEATH_*` environment overrides
//! 4. Deserialize and validate

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{CONFIG_ENV, apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Config file picked up from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "heath.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and where its values came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// The config file that was merged, if any.
    pub loaded_file: Option<PathBuf>,
    /// Environment variables that overrode a value.
    pub env_overrides: Vec<&'static str>,
}

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a named config file is missing or malformed,
/// or the final configuration fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, &collect_env_vars())
}

/// Load configuration with an explicit set of environment variables.
///
/// # Errors
///
/// As for [`load`].
pub fn load_with_env<S: BuildHasher>(
    explicit: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged = parse(DEFAULTS_TOML, "<embedded defaults>")?;

    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_vars.get(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from));

    let loaded_file = match named {
        Some(path) => {
            let overlay = read_file(&path)?.ok_or_else(|| ConfigError::ReadError {
                path: path.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
            deep_merge(&mut merged, &overlay);
            Some(path)
        },
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            read_file(&path)?.map(|overlay| {
                deep_merge(&mut merged, &overlay);
                path
            })
        },
    };
    if let Some(path) = &loaded_file {
        info!(path = %path.display(), "loaded config file");
    }

    let env_overrides = apply_env_overrides(&mut merged, env_vars);
    if !env_overrides.is_empty() {
        debug!(count = env_overrides.len(), "applied environment overrides");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_file,
        env_overrides,
    })
}

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge per field. Scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn parse(content: &str, path: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_owned(),
        source: e,
    })
}

/// Read and parse a file, returning `None` if it does not exist.
fn read_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    parse(&content, &path.display().to_string()).map(Some)
}
