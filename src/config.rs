//! Server configuration
//!
//! Settings come from command-line flags and an optional TOML file. Flags
//! take precedence over the file; anything set in neither falls back to the
//! crate defaults.
//!
//! ```toml
//! [server]
//! address = "0.0.0.0"
//! port = 6380
//!
//! [storage]
//! sweep_interval_ms = 500
//!
//! [logging]
//! level = "debug"
//! ```

use crate::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL_MS};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Command-line arguments for the server
#[derive(Parser, Debug, Default)]
#[command(name = "microkv")]
#[command(version)]
#[command(about = "An in-memory key-value server with per-key TTL", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to [default: 127.0.0.1]
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port to listen on [default: 6379]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Milliseconds between expired-key sweeps [default: 1000]
    #[arg(long, visible_alias = "clearfreq")]
    pub sweep_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub sweep_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub port: u16,
    pub sweep_interval: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Load configuration from already-parsed arguments, reading the TOML
    /// file they point at, if any.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = match cli.config {
            Some(ref path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
                        path: path.clone(),
                        source,
                    })?;
                toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => TomlConfig::default(),
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args over file values over defaults, then validate.
    pub fn merge(cli: CliArgs, file: TomlConfig) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let sweep_interval_ms = cli
            .sweep_interval_ms
            .or(file.storage.sweep_interval_ms)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS);
        if sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "sweep interval must be at least 1ms".to_string(),
            ));
        }

        Ok(Config {
            address: cli
                .address
                .or(file.server.address)
                .unwrap_or(defaults.address),
            port: cli.port.or(file.server.port).unwrap_or(defaults.port),
            sweep_interval: Duration::from_millis(sweep_interval_ms),
            log_level: cli
                .log_level
                .or(file.logging.level)
                .unwrap_or(defaults.log_level),
        })
    }

    /// Returns the bind address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}
