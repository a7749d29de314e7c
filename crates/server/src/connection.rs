//! Per-connection command interpreter
//!
//! One `Connection` runs per accepted client. The read loop is a single
//! task that decodes frames, parses commands and dispatches them in order.
//! Each SUB spawns a drain task that forwards deliveries from its
//! subscription to the same socket; every write goes through one async
//! mutex around the frame writer so replies and deliveries never interleave
//! mid-frame.
//!
//! # States
//!
//! ```text
//! Unbound ──APP ok──→ Bound
//!    │  ↖__APP err__/   │
//!    │                  │
//!  AUTH, SUB any time; PUB only when Bound
//! ```
//!
//! The connection owns a cancellation token (a child of the server's). On
//! QUIT, end of stream, a transport error or server shutdown the token is
//! cancelled and every drain task unsubscribes before the connection ends.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use logwire_broker::{Broker, BrokerRegistry, Subscription};
use logwire_protocol::{Frame, FrameReader, FrameWriter, LogRecord, ProtocolError, Topic, TopicMatcher};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::command::Command;
use crate::error::Result;
use crate::metrics::ServerMetrics;
use crate::substrate::Substrate;

/// Reply to PUB on a connection that has not bound a topic
pub const NO_APP_BOUND: &str = "ERR no app bound, send APP first";

/// Reply to APP when a field contains a key separator or line break
pub const FORBIDDEN_ARGUMENT: &str = "ERR arguments may not contain ':' or newline";

/// How long a delivery already on the wire may take to finish once the
/// connection is cancelled
pub const DELIVERY_GRACE: Duration = Duration::from_secs(1);

/// Identity and publishing topic of one connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    username: String,
    topic: Option<Topic>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claimed username; empty until AUTH
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Topic bound by APP
    #[inline]
    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.topic.is_some()
    }

    pub fn authenticate(&mut self, username: String) {
        self.username = username;
    }

    pub fn bind(&mut self, topic: Topic) {
        self.topic = Some(topic);
    }
}

/// Resources shared by every connection of a server
#[derive(Clone)]
pub struct ConnectionContext {
    pub registry: Arc<BrokerRegistry>,
    pub substrate: Option<Arc<dyn Substrate>>,
    pub metrics: Arc<ServerMetrics>,
}

impl ConnectionContext {
    pub fn new(registry: Arc<BrokerRegistry>) -> Self {
        Self {
            registry,
            substrate: None,
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    pub fn with_substrate(mut self, substrate: Arc<dyn Substrate>) -> Self {
        self.substrate = Some(substrate);
        self
    }

}

/// Write side of a connection, shared by the read loop and drain tasks
struct Outbound<W> {
    writer: FrameWriter<W>,
    /// A delivery was abandoned mid-frame; the byte stream is unusable
    torn: bool,
}

impl<W: AsyncWrite + Unpin> Outbound<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: FrameWriter::new(writer),
            torn: false,
        }
    }

    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        if self.torn {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "delivery abandoned mid-frame",
            ));
        }
        self.writer.write_frame(frame).await
    }
}

type SharedWriter<W> = Arc<Mutex<Outbound<W>>>;

enum Flow {
    Continue,
    Quit,
}

/// A client connection being served
pub struct Connection<S> {
    reader: FrameReader<ReadHalf<S>>,
    writer: SharedWriter<WriteHalf<S>>,
    state: ConnectionState,
    ctx: ConnectionContext,
    cancel: CancellationToken,
    drains: JoinSet<()>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap a stream; `cancel` ends the connection when triggered
    pub fn new(stream: S, ctx: ConnectionContext, cancel: CancellationToken) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FrameReader::new(read_half),
            writer: Arc::new(Mutex::new(Outbound::new(write_half))),
            state: ConnectionState::new(),
            ctx,
            cancel,
            drains: JoinSet::new(),
        }
    }

    /// Serve commands until QUIT, end of stream, error or cancellation
    ///
    /// All subscriptions made on this connection are removed before this
    /// returns.
    pub async fn run(mut self) -> Result<()> {
        let result = self.read_loop().await;
        self.stop_subscriptions().await;
        result
    }

    async fn read_loop(&mut self) -> Result<()> {
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                frame = self.reader.read_frame() => frame,
            };

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::debug!("client closed connection");
                    return Ok(());
                }
                Err(ProtocolError::Io(e)) => return Err(e.into()),
                Err(e) => {
                    // The stream cannot be resynchronized after bad bytes
                    self.ctx.metrics.protocol_error();
                    tracing::debug!(error = %e, "undecodable input, closing connection");
                    if let Err(write_err) = self
                        .reply(Frame::error(format!("ERR protocol error: {e}")))
                        .await
                    {
                        tracing::debug!(error = %write_err, "failed to report protocol error");
                    }
                    return Err(e.into());
                }
            };

            self.ctx.metrics.command();
            let command = match Command::parse(frame) {
                Ok(command) => command,
                Err(e) => {
                    self.ctx.metrics.command_error();
                    self.reply(e.to_frame()).await?;
                    continue;
                }
            };

            tracing::trace!(command = command.name(), "dispatching");
            if let Flow::Quit = self.dispatch(command).await? {
                return Ok(());
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => {
                self.stop_subscriptions().await;
                self.reply(Frame::ok()).await?;
                return Ok(Flow::Quit);
            }
            Command::Auth { username, .. } => {
                tracing::debug!(username = %username, "authenticated");
                self.state.authenticate(username);
                self.reply(Frame::ok()).await?;
            }
            Command::App { app, process, host } => match Topic::new(app, process, host) {
                Ok(topic) => {
                    tracing::debug!(topic = %topic, "bound app");
                    self.state.bind(topic);
                    self.reply(Frame::ok()).await?;
                }
                Err(_) => {
                    self.ctx.metrics.command_error();
                    self.reply(Frame::error(FORBIDDEN_ARGUMENT)).await?;
                }
            },
            Command::Pub { timestamp, line } => self.publish(timestamp, line).await?,
            Command::Sub {
                app_glob,
                proc_glob,
                host_glob,
            } => {
                let matcher = TopicMatcher::from_globs(&app_glob, &proc_glob, &host_glob);
                self.subscribe(matcher).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn publish(&self, timestamp: i64, line: String) -> Result<()> {
        let Some(topic) = self.state.topic() else {
            self.ctx.metrics.command_error();
            self.reply(Frame::error(NO_APP_BOUND)).await?;
            return Ok(());
        };

        let record = LogRecord::new(timestamp, line);
        // A namespace without a broker has never had a subscriber
        let delivered = match self.ctx.registry.get(self.state.username()) {
            Some(broker) => broker.notify(&record, topic).await,
            None => 0,
        };
        self.ctx.metrics.published(delivered);

        let Some(substrate) = &self.ctx.substrate else {
            return Ok(());
        };

        let key = topic.key(self.state.username());
        let value = format!("{}:{}", record.timestamp, record.raw);

        if let Err(e) = substrate.publish(&key, &value).await {
            self.ctx.metrics.substrate_error();
            tracing::error!(key = %key, timestamp, error = %e, "failed to publish to substrate");
            self.reply(Frame::error(format!("ERR stream: {value}"))).await?;
        }
        if let Err(e) = substrate.store(&key, record.timestamp, &value).await {
            self.ctx.metrics.substrate_error();
            tracing::error!(key = %key, timestamp, error = %e, "failed to store in substrate");
            self.reply(Frame::error(format!("ERR storage: {value}"))).await?;
        }
        Ok(())
    }

    async fn subscribe(&mut self, matcher: TopicMatcher) -> Result<()> {
        let broker = self.ctx.registry.get_or_create(self.state.username());
        let mut subscription = broker.subscribe(matcher).await;
        self.ctx.metrics.subscribed();

        // Acknowledge before any delivery can be written
        if let Err(e) = self.reply(Frame::ok()).await {
            if let Err(unsub_err) = broker.unsubscribe(&mut subscription).await {
                tracing::debug!(error = %unsub_err, "failed to release subscription");
            }
            return Err(e.into());
        }

        let drain = drain_subscription(
            broker,
            subscription,
            Arc::clone(&self.writer),
            self.cancel.clone(),
        );
        self.drains.spawn(drain.in_current_span());
        Ok(())
    }

    /// Cancel drain tasks and wait until each has unsubscribed
    async fn stop_subscriptions(&mut self) {
        self.cancel.cancel();
        while let Some(result) = self.drains.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "subscription task failed");
            }
        }
    }

    async fn reply(&self, frame: Frame) -> io::Result<()> {
        self.writer.lock().await.write_frame(&frame).await
    }
}

/// Forward deliveries from one subscription to the client
async fn drain_subscription<W>(
    broker: Arc<Broker>,
    mut subscription: Subscription,
    writer: SharedWriter<W>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let subscription_id = subscription.id();

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = subscription.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let frame = message.to_frame();
        let mut out = tokio::select! {
            _ = cancel.cancelled() => break,
            out = writer.lock() => out,
        };

        // A started frame must be finished or the transport given up
        let written = {
            let write = out.write_frame(&frame);
            tokio::pin!(write);
            tokio::select! {
                result = &mut write => Some(result),
                _ = cancel.cancelled() => tokio::time::timeout(DELIVERY_GRACE, &mut write).await.ok(),
            }
        };

        match written {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                tracing::debug!(subscription_id, error = %e, "delivery write failed, ending subscription");
                break;
            }
            None => {
                out.torn = true;
                tracing::debug!(subscription_id, "delivery stalled after cancellation, abandoning transport");
                break;
            }
        }
    }

    if let Err(e) = broker.unsubscribe(&mut subscription).await {
        tracing::debug!(subscription_id, error = %e, "unsubscribe failed");
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
