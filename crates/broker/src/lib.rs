//! logwire broker - in-memory publish/subscribe fan-out
//!
//! A `Broker` keeps the set of live subscriptions for one user namespace and
//! delivers every published record to each subscription whose matcher
//! accepts the record's topic. A `BrokerRegistry` maps usernames to brokers,
//! creating them on first use.
//!
//! # Architecture
//!
//! ```text
//! PUB ──→ BrokerRegistry.get_or_create(user)
//!              │
//!              ▼
//!           Broker.notify(record, topic)   (shared lock)
//!              │
//!         ┌────┴────┐
//!         ▼         ▼
//!     matcher?   matcher?
//!         │         │
//!         ▼         ▼
//!      queue      queue      (bounded, awaits when full)
//!         │         │
//!         ▼         ▼
//!   Subscription  Subscription
//! ```
//!
//! Delivery never drops: a full queue makes `notify` wait, which pushes
//! backpressure onto the publisher. Unsubscribing closes the queue first so
//! a waiting `notify` is released before the registration is removed.

mod broker;
mod error;
mod registry;

pub use broker::{Broker, BrokerStats, DEFAULT_QUEUE_CAPACITY, Subscription};
pub use error::{BrokerError, Result};
pub use registry::BrokerRegistry;
