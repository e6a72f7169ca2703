//! Heath CLI - append to, inspect and verify signed block logs.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;

use commands::{blocks, drivers, keys, verify};

/// Heath - signed append-only block logs
#[derive(Parser)]
#[command(name = "heath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Block log to operate on (overrides `store.path`)
    #[arg(long, global = true, value_name = "PATH")]
    log_path: Option<PathBuf>,

    /// Storage backend (overrides `store.driver`)
    #[arg(long, global = true, value_name = "NAME")]
    driver: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the signing key, or show it if it exists
    Keygen {
        /// Key file (overrides `keys.signing_key`)
        #[arg(long, value_name = "PATH")]
        key: Option<PathBuf>,
    },

    /// Chain a new block onto the head of the log
    Append {
        /// Payload text
        #[arg(required_unless_present = "file")]
        text: Option<String>,

        /// Read the payload from a file instead
        #[arg(long, conflicts_with = "text", value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Print a block by content hash
    Get {
        /// Hex content hash of the payload
        hash: String,

        /// Write only the raw payload bytes
        #[arg(long)]
        raw: bool,
    },

    /// List every block in write order
    Dump {
        /// Include payloads
        #[arg(long)]
        payloads: bool,
    },

    /// Verify the whole chain, failing on the first bad block
    Verify {
        /// Only accept blocks signed by this base64 public key (repeatable)
        #[arg(long = "trusted", value_name = "KEY")]
        trusted: Vec<String>,
    },

    /// List registered storage backends
    Drivers,

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = heath_config::Config::load(cli.config.as_deref())?;

    // Set up logging from config, with --verbose override.
    let mut log_config = config_bridge::to_log_config(&resolved.config.logging);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = heath_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut config = resolved.config.clone();
    if let Some(path) = cli.log_path {
        config.store.path = path;
    }
    if let Some(driver) = cli.driver {
        config.store.driver = driver;
    }

    match cli.command {
        Commands::Keygen { key } => {
            let path = key.unwrap_or_else(|| config.keys.signing_key.clone());
            keys::keygen(&path)?;
        },
        Commands::Append { text, file } => {
            let payload = match (text, file) {
                (_, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading payload from {}", path.display()))?,
                (Some(text), None) => text.into_bytes(),
                (None, None) => anyhow::bail!("provide payload text or --file"),
            };
            blocks::append(&config, payload).await?;
        },
        Commands::Get { hash, raw } => {
            blocks::get(&config, &hash, raw)?;
        },
        Commands::Dump { payloads } => {
            blocks::dump(&config, payloads).await?;
        },
        Commands::Verify { trusted } => {
            verify::verify(&config, &trusted).await?;
        },
        Commands::Drivers => {
            drivers::list(&config.store.driver);
        },
        Commands::Config => {
            commands::config::show(&resolved, &config)?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["heath", "dump", "--driver", "jsonl", "--log-path", "x.log"])
            .unwrap();
        assert_eq!(cli.driver.as_deref(), Some("jsonl"));
        assert_eq!(cli.log_path, Some(PathBuf::from("x.log")));
        assert!(matches!(cli.command, Commands::Dump { payloads: false }));
    }

    #[test]
    fn test_append_requires_payload() {
        assert!(Cli::try_parse_from(["heath", "append"]).is_err());
        assert!(Cli::try_parse_from(["heath", "append", "hello"]).is_ok());
        assert!(Cli::try_parse_from(["heath", "append", "--file", "p.bin"]).is_ok());
        assert!(Cli::try_parse_from(["heath", "append", "hi", "--file", "p.bin"]).is_err());
    }
}
