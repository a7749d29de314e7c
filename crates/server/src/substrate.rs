//! External fan-out substrate
//!
//! A substrate mirrors published lines into an external pub/sub and
//! sorted-set store (for example a Redis instance). The collector works
//! without one; when configured, every accepted PUB is forwarded as
//! `publish(key, "ts:line")` followed by `store(key, ts, "ts:line")`, where
//! `key` is `username:app:proc:host`.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a substrate backend
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SubstrateError {
    message: String,
}

impl SubstrateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External pub/sub and storage backend
#[async_trait]
pub trait Substrate: Send + Sync {
    /// Publish `value` on channel `key`
    async fn publish(&self, key: &str, value: &str) -> Result<(), SubstrateError>;

    /// Add `value` to the sorted set at `key` with the given score
    async fn store(&self, key: &str, score: i64, value: &str) -> Result<(), SubstrateError>;
}
