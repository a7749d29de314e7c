//! Broker configuration

use serde::Deserialize;

/// `[broker]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Per-subscription queue depth; publishers wait when a queue is full
    /// Default: 64
    pub queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}
