//! Collector connection metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the accept loop and every connection task
#[derive(Debug, Default)]
pub struct ServerMetrics {
    connections_active: AtomicU64,
    connections_total: AtomicU64,
    commands: AtomicU64,
    publishes: AtomicU64,
    deliveries: AtomicU64,
    subscriptions: AtomicU64,
    command_errors: AtomicU64,
    protocol_errors: AtomicU64,
    substrate_errors: AtomicU64,
    accept_errors: AtomicU64,
}

impl ServerMetrics {
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            commands: AtomicU64::new(0),
            publishes: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            subscriptions: AtomicU64::new(0),
            command_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            substrate_errors: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a PUB and the number of subscribers it reached
    #[inline]
    pub fn published(&self, delivered: usize) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn subscribed(&self) {
        self.subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    /// A command that was answered with an error reply
    #[inline]
    pub fn command_error(&self) {
        self.command_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Undecodable input that closed a connection
    #[inline]
    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn substrate_error(&self) {
        self.substrate_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ServerMetricsSnapshot {
        ServerMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            subscriptions: self.subscriptions.load(Ordering::Relaxed),
            command_errors: self.command_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            substrate_errors: self.substrate_errors.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ServerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub commands: u64,
    pub publishes: u64,
    pub deliveries: u64,
    pub subscriptions: u64,
    pub command_errors: u64,
    pub protocol_errors: u64,
    pub substrate_errors: u64,
    pub accept_errors: u64,
}
