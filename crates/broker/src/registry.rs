//! Per-user broker registry
//!
//! Every username gets its own broker, so publishers and subscribers only
//! see traffic within their namespace. The empty username is the default
//! namespace used by connections that never send AUTH.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::broker::{Broker, BrokerStats, DEFAULT_QUEUE_CAPACITY};

/// Maps usernames to lazily created brokers
#[derive(Debug)]
pub struct BrokerRegistry {
    queue_capacity: usize,
    brokers: RwLock<HashMap<String, Arc<Broker>>>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a registry whose brokers use `capacity` deep queues
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            queue_capacity: capacity,
            brokers: RwLock::new(HashMap::new()),
        }
    }

    /// Get the broker for `username`, creating it on first use
    pub fn get_or_create(&self, username: &str) -> Arc<Broker> {
        if let Some(broker) = self.brokers.read().get(username) {
            return Arc::clone(broker);
        }

        let mut brokers = self.brokers.write();
        let broker = brokers.entry(username.to_owned()).or_insert_with(|| {
            tracing::debug!(username, "creating broker");
            Arc::new(Broker::with_queue_capacity(self.queue_capacity))
        });
        Arc::clone(broker)
    }

    /// Get the broker for `username` if one exists
    pub fn get(&self, username: &str) -> Option<Arc<Broker>> {
        self.brokers.read().get(username).cloned()
    }

    /// Number of user namespaces with a broker
    pub fn len(&self) -> usize {
        self.brokers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.read().is_empty()
    }

    /// Snapshot counters for every broker, keyed by username
    pub async fn stats(&self) -> Vec<(String, BrokerStats)> {
        let brokers: Vec<(String, Arc<Broker>)> = self
            .brokers
            .read()
            .iter()
            .map(|(name, broker)| (name.clone(), Arc::clone(broker)))
            .collect();

        let mut out = Vec::with_capacity(brokers.len());
        for (name, broker) in brokers {
            out.push((name, broker.stats().await));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl Default for BrokerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
