//! Commonly used types: `use heath_telemetry::prelude::*;`

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Logging configuration
pub use crate::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget};

// Setup functions
pub use crate::{setup_default_logging, setup_logging};
