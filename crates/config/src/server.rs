//! Collector listener configuration

use std::time::Duration;

use serde::Deserialize;

pub use logwire_protocol::DEFAULT_PORT;

/// `[server]` section
///
/// ```toml
/// [server]
/// address = "0.0.0.0"
/// port = 7701
/// nodelay = true
/// keepalive = "60s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    /// Default: "0.0.0.0"
    pub address: String,

    /// Listen port; 0 binds an ephemeral port
    /// Default: 7701
    pub port: u16,

    /// Enable TCP_NODELAY on accepted connections
    /// Default: true
    pub nodelay: bool,

    /// Idle time before TCP keepalive probes; "0s" disables keepalive
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,
}

impl ServerConfig {
    /// Keepalive idle time, or `None` when disabled
    pub fn keepalive(&self) -> Option<Duration> {
        (!self.keepalive.is_zero()).then_some(self.keepalive)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            nodelay: true,
            keepalive: Duration::from_secs(60),
        }
    }
}
