//! Environment variable overrides.
//!
//! Each supported `HEATH_*` variable replaces one config field, whatever the
//! config file said.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

/// Names the config file to load when no path is given explicitly.
pub const CONFIG_ENV: &str = "HEATH_CONFIG";

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "HEATH_DRIVER",
        field_path: "store.driver",
    },
    EnvMapping {
        var_name: "HEATH_LOG_PATH",
        field_path: "store.path",
    },
    EnvMapping {
        var_name: "HEATH_SIGNING_KEY",
        field_path: "keys.signing_key",
    },
    EnvMapping {
        var_name: "HEATH_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "HEATH_LOG_DIR",
        field_path: "logging.file.directory",
    },
];

/// Snapshot the `HEATH_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("HEATH_"))
        .collect()
}

/// Write every set variable into its field of `merged`.
///
/// Empty values are ignored. Returns the names of the variables applied.
pub fn apply_env_overrides<S: BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();

    for mapping in ENV_MAPPINGS {
        let Some(value) = env_vars.get(mapping.var_name).filter(|v| !v.is_empty()) else {
            continue;
        };
        if set_path(merged, mapping.field_path, toml::Value::String(value.clone())) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applied environment override"
            );
            applied.push(mapping.var_name);
        }
    }

    applied
}

/// Set the dotted `path` in a table tree, creating intermediate tables.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut node = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = node.as_table_mut() else {
            return false;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return true;
        }
        node = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_value() {
        let mut merged: toml::Value = toml::from_str("[store]\ndriver = \"binary\"").unwrap();
        let env: HashMap<String, String> =
            [("HEATH_DRIVER".to_owned(), "jsonl".to_owned())].into();

        let applied = apply_env_overrides(&mut merged, &env);

        assert_eq!(applied, vec!["HEATH_DRIVER"]);
        assert_eq!(merged["store"]["driver"].as_str(), Some("jsonl"));
    }

    #[test]
    fn test_missing_tables_are_created() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env: HashMap<String, String> =
            [("HEATH_SIGNING_KEY".to_owned(), "/tmp/k".to_owned())].into();

        apply_env_overrides(&mut merged, &env);
        assert_eq!(merged["keys"]["signing_key"].as_str(), Some("/tmp/k"));
    }

    #[test]
    fn test_empty_value_ignored() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let env: HashMap<String, String> =
            [("HEATH_LOG_LEVEL".to_owned(), String::new())].into();

        assert!(apply_env_overrides(&mut merged, &env).is_empty());
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
    }
}
