//! Tail command - stream live lines from a collector
//!
//! Subscribes with glob patterns for app, proc and host and prints every
//! delivered line until interrupted or the collector goes away.

mod output;

use anyhow::{Context, Result};
use clap::Args;
use logwire_client::TailClient;

use output::{Format, Formatter};

/// Tail command arguments
#[derive(Args, Debug)]
pub struct TailArgs {
    /// Collector address (host:port)
    #[arg(short, long, default_value = "localhost:7701", env = "LOGWIRE_ADDRESS")]
    address: String,

    /// Namespace username
    #[arg(short = 'U', long, default_value = "")]
    username: String,

    /// Namespace password
    #[arg(short = 'W', long, default_value = "", env = "LOGWIRE_PASSWORD")]
    password: String,

    /// Glob pattern for the app
    #[arg(short = 'A', long, default_value = "*")]
    app: String,

    /// Glob pattern for the process
    #[arg(short = 'P', long = "proc", default_value = "*")]
    process: String,

    /// Glob pattern for the host
    #[arg(short = 'H', long, default_value = "*")]
    host: String,

    /// Output format
    #[arg(short, long = "output", value_enum, default_value_t = Format::Text)]
    output: Format,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Run the tail command
pub async fn run(args: TailArgs) -> Result<()> {
    let use_color = atty::is(atty::Stream::Stdout) && !args.no_color;
    let formatter = Formatter::new(args.output, use_color);

    tracing::info!(address = %args.address, "connecting to collector");

    let mut client = TailClient::connect(&args.address)
        .await
        .context("failed to connect")?;
    client
        .auth(&args.username, &args.password)
        .await
        .context("AUTH failed")?;
    client
        .subscribe(&args.app, &args.process, &args.host)
        .await
        .context("SUB failed")?;

    tracing::info!(
        app = %args.app,
        proc = %args.process,
        host = %args.host,
        "streaming lines (Ctrl+C to stop)"
    );

    let shutdown = super::wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = client.next_delivery() => match result {
                Ok(Some(delivery)) => formatter.print(&delivery),
                Ok(None) => {
                    tracing::info!("connection closed by collector");
                    return Ok(());
                }
                Err(e) => return Err(e).context("stream failed"),
            },
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("interrupted, shutting down");
    if let Err(e) = client.quit().await {
        tracing::debug!(error = %e, "QUIT failed");
    }
    Ok(())
}
