//! Topic fan-out broker
//!
//! Each subscription owns the receiving half of a bounded queue; the broker
//! keeps the sending half together with the subscription's matcher. The
//! registration list sits behind an async shared/exclusive lock:
//!
//! - `notify` takes the shared lock for the whole fan-out pass
//! - `subscribe` and `unsubscribe` take the exclusive lock
//!
//! `notify` awaits on a full queue while holding the shared lock, so a
//! writer waiting for the exclusive lock cannot make progress until the
//! stalled queue frees up. `unsubscribe` therefore closes its queue before
//! asking for the lock, which fails any send blocked on that queue.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};

use logwire_protocol::{LogRecord, Message, Topic, TopicMatcher};

use crate::error::{BrokerError, Result};

/// Default per-subscription queue depth
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Counter for generating unique broker IDs
static BROKER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Broker-side half of a subscription
#[derive(Debug)]
struct Registration {
    id: u64,
    matcher: TopicMatcher,
    sender: mpsc::Sender<Message>,
}

/// A live subscription to a broker
///
/// Drained only by the task that owns it. End it with
/// [`Broker::unsubscribe`]; dropping it without unsubscribing leaves a
/// registration that `notify` skips as closed.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    broker_id: u64,
    receiver: mpsc::Receiver<Message>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next delivered message
    ///
    /// Returns None once the subscription has been unsubscribed.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Take a buffered message without waiting
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }
}

/// Broker counters
#[derive(Debug, Default)]
struct BrokerMetrics {
    notified: AtomicU64,
    delivered: AtomicU64,
    skipped_closed: AtomicU64,
    subscribed: AtomicU64,
    unsubscribed: AtomicU64,
}

/// Snapshot of broker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Records passed to `notify`
    pub notified: u64,
    /// Messages enqueued across all subscriptions
    pub delivered: u64,
    /// Deliveries skipped because the subscription queue was closed
    pub skipped_closed: u64,
    pub subscribed: u64,
    pub unsubscribed: u64,
    /// Registrations at the time of the snapshot
    pub subscribers: usize,
}

/// In-memory publish/subscribe fan-out for one user namespace
#[derive(Debug)]
pub struct Broker {
    id: u64,
    queue_capacity: usize,
    next_subscription_id: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
    metrics: BrokerMetrics,
}

impl Broker {
    /// Create a broker with the default queue capacity
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a broker whose subscription queues hold `capacity` messages
    ///
    /// A capacity of 0 is raised to 1.
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            id: BROKER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            queue_capacity: capacity.max(1),
            next_subscription_id: AtomicU64::new(1),
            registrations: RwLock::new(Vec::new()),
            metrics: BrokerMetrics::default(),
        }
    }

    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Register a new subscription
    pub async fn subscribe(&self, matcher: TopicMatcher) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            subscription_id = id,
            app = matcher.app_pattern(),
            proc = matcher.proc_pattern(),
            host = matcher.host_pattern(),
            "subscribing"
        );

        self.registrations.write().await.push(Registration {
            id,
            matcher,
            sender,
        });
        self.metrics.subscribed.fetch_add(1, Ordering::Relaxed);

        Subscription {
            id,
            broker_id: self.id,
            receiver,
        }
    }

    /// Remove a subscription
    ///
    /// Closes the queue, discards anything still buffered, then removes the
    /// registration. After this, `recv` on the subscription yields None.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionNotFound` if the subscription was already
    /// removed or belongs to a different broker.
    pub async fn unsubscribe(&self, subscription: &mut Subscription) -> Result<()> {
        if subscription.broker_id != self.id {
            return Err(BrokerError::SubscriptionNotFound {
                id: subscription.id,
            });
        }

        subscription.receiver.close();
        while subscription.receiver.try_recv().is_ok() {}

        let mut registrations = self.registrations.write().await;
        let Some(pos) = registrations.iter().position(|r| r.id == subscription.id) else {
            return Err(BrokerError::SubscriptionNotFound {
                id: subscription.id,
            });
        };
        registrations.swap_remove(pos);
        drop(registrations);

        self.metrics.unsubscribed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(subscription_id = subscription.id, "unsubscribed");
        Ok(())
    }

    /// Deliver a record to every subscription whose matcher accepts `topic`
    ///
    /// Waits on full queues. Returns the number of subscriptions the message
    /// was enqueued on.
    pub async fn notify(&self, record: &LogRecord, topic: &Topic) -> usize {
        self.metrics.notified.fetch_add(1, Ordering::Relaxed);

        let registrations = self.registrations.read().await;
        let mut delivered = 0;

        for registration in registrations.iter() {
            if !registration.matcher.matches(topic) {
                continue;
            }

            let message = Message::new(topic.clone(), record.clone());
            match registration.sender.send(message).await {
                Ok(()) => delivered += 1,
                Err(_) => {
                    self.metrics.skipped_closed.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(
                        subscription_id = registration.id,
                        "skipping closed subscription"
                    );
                }
            }
        }

        self.metrics
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    /// Number of registered subscriptions
    pub async fn subscriber_count(&self) -> usize {
        self.registrations.read().await.len()
    }

    /// Snapshot the broker counters
    pub async fn stats(&self) -> BrokerStats {
        BrokerStats {
            notified: self.metrics.notified.load(Ordering::Relaxed),
            delivered: self.metrics.delivered.load(Ordering::Relaxed),
            skipped_closed: self.metrics.skipped_closed.load(Ordering::Relaxed),
            subscribed: self.metrics.subscribed.load(Ordering::Relaxed),
            unsubscribed: self.metrics.unsubscribed.load(Ordering::Relaxed),
            subscribers: self.subscriber_count().await,
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "broker_test.rs"]
mod tests;
