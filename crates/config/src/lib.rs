//! logwire configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config; only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logwire_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 7801").unwrap();
//! assert_eq!(config.server.port, 7801);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [server]
//! address = "0.0.0.0"
//! port = 7701
//! keepalive = "60s"
//!
//! [broker]
//! queue_capacity = 64
//!
//! [agent]
//! buffer_capacity = 1024
//! redial_interval = "1s"
//! ```

mod agent;
mod broker;
mod error;
mod logging;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use agent::AgentConfig;
pub use broker::BrokerConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use server::{DEFAULT_PORT, ServerConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Collector listener
    pub server: ServerConfig,

    /// Per-namespace brokers
    pub broker: BrokerConfig,

    /// Log shipping agent
    pub agent: AgentConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
