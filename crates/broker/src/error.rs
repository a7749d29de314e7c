//! Error types for the broker crate

use thiserror::Error;

/// Errors that can occur in the broker
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BrokerError {
    /// Subscription is not (or no longer) registered with this broker
    #[error("subscription not found: {id}")]
    SubscriptionNotFound { id: u64 },
}

/// Result type for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
