//! Serve command - run the collector

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use logwire_broker::BrokerRegistry;
use logwire_config::Config;
use logwire_server::{CollectorConfig, CollectorServer};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::wait_for_shutdown;

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address, overrides [server] address
    #[arg(short, long)]
    pub address: Option<String>,

    /// Listen port, overrides [server] port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, config: Config) -> Result<()> {
    let server = &config.server;
    let collector_config = CollectorConfig {
        address: args.address.unwrap_or_else(|| server.address.clone()),
        port: args.port.unwrap_or(server.port),
        nodelay: server.nodelay,
        keepalive: server.keepalive(),
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %collector_config.bind_address(),
        queue_capacity = config.broker.queue_capacity,
        "logwire starting"
    );

    let registry = Arc::new(BrokerRegistry::with_queue_capacity(
        config.broker.queue_capacity,
    ));
    let collector = CollectorServer::new(collector_config, Arc::clone(&registry));

    let cancel = CancellationToken::new();
    let mut handle = tokio::spawn(collector.run(cancel.clone()));

    tokio::select! {
        // Bind failures end the collector before any signal arrives
        result = &mut handle => {
            result
                .context("collector task panicked")?
                .context("collector failed")?;
            warn!("collector stopped unexpectedly");
            return Ok(());
        }
        _ = wait_for_shutdown() => {}
    }

    info!("shutdown signal received, stopping collector...");
    cancel.cancel();

    let snapshot = handle
        .await
        .context("collector task panicked")?
        .context("collector failed")?;

    for (username, stats) in registry.stats().await {
        info!(
            username = %username,
            notified = stats.notified,
            delivered = stats.delivered,
            skipped_closed = stats.skipped_closed,
            subscribed = stats.subscribed,
            "broker stats"
        );
    }

    info!(
        connections = snapshot.connections_total,
        commands = snapshot.commands,
        command_errors = snapshot.command_errors,
        protocol_errors = snapshot.protocol_errors,
        "logwire shutdown complete"
    );
    Ok(())
}
