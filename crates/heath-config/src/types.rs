use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Full Heath configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how blocks are stored.
    pub store: StoreConfig,
    /// Signing key location.
    pub keys: KeysConfig,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Registered driver name (`"binary"`, `"jsonl"`).
    pub driver: String,
    /// Log file location.
    pub path: PathBuf,
    /// Blocks buffered ahead of a slow stream consumer.
    pub stream_buffer: usize,
    /// Sync every append to disk before it is acknowledged.
    pub fsync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: "binary".to_owned(),
            path: PathBuf::from("heath.log"),
            stream_buffer: 64,
            fsync: true,
        }
    }
}

/// Signing key location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Ed25519 secret key file, created on first use.
    pub signing_key: PathBuf,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            signing_key: PathBuf::from("heath.key"),
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["heath_db=debug"]`).
    pub directives: Vec<String>,
    /// Write logs to rotating files instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<LogFileSection>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            file: None,
        }
    }
}

/// The `[logging.file]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFileSection {
    /// Directory the log files are written to.
    pub directory: PathBuf,
    /// File name prefix.
    pub prefix: String,
    /// `"daily"`, `"hourly"`, `"minutely"` or `"never"`.
    pub rotation: String,
}

impl Default for LogFileSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: "heath".to_owned(),
            rotation: "daily".to_owned(),
        }
    }
}
