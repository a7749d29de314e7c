//! Collector TCP server
//!
//! Accepts client connections and runs one [`Connection`] task per client.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logwire_broker::BrokerRegistry;
//! use logwire_server::{CollectorConfig, CollectorServer};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = Arc::new(BrokerRegistry::new());
//! let server = CollectorServer::new(CollectorConfig::default(), registry);
//! let metrics = server.run(CancellationToken::new()).await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use logwire_broker::BrokerRegistry;
use logwire_protocol::DEFAULT_PORT;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::connection::{Connection, ConnectionContext};
use crate::error::{Result, ServerError};
use crate::metrics::{ServerMetrics, ServerMetricsSnapshot};
use crate::substrate::Substrate;

/// Collector listener configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port (0 picks an ephemeral port)
    pub port: u16,

    /// Disable Nagle's algorithm on accepted sockets
    pub nodelay: bool,

    /// Idle time before TCP keepalive probes start (None disables keepalive)
    pub keepalive: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            nodelay: true,
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl CollectorConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Socket address string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// The log collector
pub struct CollectorServer {
    config: CollectorConfig,
    ctx: ConnectionContext,
}

impl CollectorServer {
    pub fn new(config: CollectorConfig, registry: Arc<BrokerRegistry>) -> Self {
        Self {
            config,
            ctx: ConnectionContext::new(registry),
        }
    }

    /// Forward every accepted PUB to an external substrate
    pub fn with_substrate(mut self, substrate: Arc<dyn Substrate>) -> Self {
        self.ctx = self.ctx.with_substrate(substrate);
        self
    }

    /// Shared metrics; stays valid after `run` consumes the server
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.ctx.metrics)
    }

    pub fn registry(&self) -> Arc<BrokerRegistry> {
        Arc::clone(&self.ctx.registry)
    }

    /// Bind the configured address and serve until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<ServerMetricsSnapshot> {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: bind_addr.clone(),
                source,
            })?;

        self.serve(listener, cancel).await
    }

    /// Serve connections from an already bound listener until cancelled
    ///
    /// Waits for every connection task to finish before returning.
    pub async fn serve(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<ServerMetricsSnapshot> {
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "collector listening");

        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.accept() => match result {
                    Ok((stream, peer_addr)) => {
                        self.spawn_connection(&tracker, stream, peer_addr, cancel.child_token());
                    }
                    Err(e) => {
                        // Transient accept errors - log and continue
                        tracing::warn!(error = %e, "accept error");
                        self.ctx.metrics.accept_error();
                    }
                },
            }
        }

        drop(listener);
        tracker.close();
        tracker.wait().await;

        let snapshot = self.ctx.metrics.snapshot();
        tracing::info!(
            connections = snapshot.connections_total,
            publishes = snapshot.publishes,
            deliveries = snapshot.deliveries,
            "collector stopped"
        );
        Ok(snapshot)
    }

    fn spawn_connection(
        &self,
        tracker: &TaskTracker,
        stream: TcpStream,
        peer_addr: SocketAddr,
        cancel: CancellationToken,
    ) {
        self.configure_socket(&stream);

        let ctx = self.ctx.clone();
        let metrics = Arc::clone(&ctx.metrics);
        metrics.connection_opened();

        let span = tracing::info_span!("connection", peer = %peer_addr);
        tracker.spawn(
            async move {
                tracing::debug!("connection accepted");
                match Connection::new(stream, ctx, cancel).run().await {
                    Ok(()) => tracing::debug!("connection closed"),
                    Err(e) => tracing::debug!(error = %e, "connection ended with error"),
                }
                metrics.connection_closed();
            }
            .instrument(span),
        );
    }

    fn configure_socket(&self, stream: &TcpStream) {
        let socket = SockRef::from(stream);

        if self.config.nodelay
            && let Err(e) = socket.set_tcp_nodelay(true)
        {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }

        if let Some(idle) = self.config.keepalive {
            let keepalive = TcpKeepalive::new()
                .with_time(idle)
                .with_interval(Duration::from_secs(10));
            if let Err(e) = socket.set_tcp_keepalive(&keepalive) {
                tracing::debug!(error = %e, "failed to set TCP keepalive");
            }
        }
    }
}
