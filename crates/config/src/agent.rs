//! Shipping agent configuration
//!
//! Tuning for `logwire agent`. Where to ship and under which topic comes
//! from the command line.

use std::time::Duration;

use serde::Deserialize;

/// `[agent]` section
///
/// ```toml
/// [agent]
/// buffer_capacity = 1024
/// redial_interval = "1s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Lines buffered while the collector is unreachable
    /// Default: 1024
    pub buffer_capacity: usize,

    /// Pause between reconnect attempts
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub redial_interval: Duration,

    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1024,
            redial_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}
