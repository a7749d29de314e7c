//! Resilient log shipper
//!
//! Ships log lines from a producing application to a collector without ever
//! blocking the producer on network state.
//!
//! # Design
//!
//! ```text
//! app ──write()──→ Shipper ──try_send──→ bounded queue ──→ ShipperTask ──PUB──→ collector
//!                     │                                        │
//!                     └─ BufferFull when the queue is full      └─ redial loop on failure
//! ```
//!
//! - `write` stamps the line and enqueues it; a full queue drops the line
//!   and returns `BufferFull` immediately
//! - The task sends each record as `PUB <nanos> <line>`; on any failure it
//!   sleeps `redial_interval`, dials, re-runs the AUTH/APP handshake, and
//!   re-sends the record that failed
//! - Delivery is at most once for records dropped on overflow, exactly once
//!   for records that made it into the queue and were sent before a
//!   connection failure was observed
//!
//! # Example
//!
//! ```ignore
//! use std::io::Write;
//! use logwire_client::{Shipper, ShipperConfig};
//!
//! let config = ShipperConfig::from_url("logwire://collector:7701?app=web")?;
//! let (mut shipper, task) = Shipper::new(config);
//! tokio::spawn(task.run());
//!
//! writeln!(shipper, "service started")?;
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use logwire_protocol::{Frame, FrameReader, FrameWriter, LogRecord};
use tokio::io::{AsyncRead, WriteHalf};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::ShipperConfig;
use crate::dialer::{Dialer, TcpDialer};
use crate::error::{ClientError, Result};
use crate::reply::expect_ok;

/// Shipper counters
#[derive(Debug, Default)]
pub struct ShipperMetrics {
    written: AtomicU64,
    dropped: AtomicU64,
    sent: AtomicU64,
    send_failures: AtomicU64,
    reconnects: AtomicU64,
}

impl ShipperMetrics {
    pub fn snapshot(&self) -> ShipperMetricsSnapshot {
        ShipperMetricsSnapshot {
            written: self.written.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ShipperMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipperMetricsSnapshot {
    /// Lines accepted into the queue
    pub written: u64,
    /// Lines rejected because the queue was full
    pub dropped: u64,
    /// Records written to a collector
    pub sent: u64,
    pub send_failures: u64,
    pub reconnects: u64,
}

/// Producer handle; cheap to clone
///
/// Implements [`std::io::Write`] so it can sit behind a logger. Every
/// `write` call is one log line.
#[derive(Debug, Clone)]
pub struct Shipper {
    sender: mpsc::Sender<LogRecord>,
    metrics: Arc<ShipperMetrics>,
}

impl Shipper {
    /// Create a shipper that dials the collector over TCP
    ///
    /// The returned task must be spawned for records to leave the process.
    pub fn new(config: ShipperConfig) -> (Self, ShipperTask<TcpDialer>) {
        Self::with_dialer(config, TcpDialer::default())
    }

    /// Create a shipper with a custom dialer
    pub fn with_dialer<D: Dialer>(config: ShipperConfig, dialer: D) -> (Self, ShipperTask<D>) {
        let (sender, receiver) = mpsc::channel(config.buffer_capacity.max(1));
        let metrics = Arc::new(ShipperMetrics::default());

        let shipper = Self {
            sender,
            metrics: Arc::clone(&metrics),
        };
        let task = ShipperTask {
            config,
            dialer,
            receiver,
            connection: Mutex::new(None),
            metrics,
            cancel: CancellationToken::new(),
        };
        (shipper, task)
    }

    /// Queue one log line, stamped with the current time
    ///
    /// One trailing newline (`\n` or `\r\n`) is removed. Never waits.
    ///
    /// # Errors
    ///
    /// Returns `BufferFull` if the queue is full (the line is dropped) and
    /// `Closed` if the shipper task has stopped.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let line = strip_newline(buf);
        let record = LogRecord::now(String::from_utf8_lossy(line));

        match self.sender.try_send(record) {
            Ok(()) => {
                self.metrics.written.fetch_add(1, Ordering::Relaxed);
                Ok(buf.len())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("shipper buffer full, dropping line");
                Err(ClientError::BufferFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ClientError::Closed),
        }
    }

    /// Queue a line given as text
    pub fn write_line(&self, line: &str) -> Result<()> {
        self.write(line.as_bytes()).map(|_| ())
    }

    pub fn metrics(&self) -> ShipperMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl io::Write for Shipper {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Shipper::write(self, buf).map_err(|e| match e {
            ClientError::BufferFull => io::Error::new(io::ErrorKind::WouldBlock, e),
            other => io::Error::other(other),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn strip_newline(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// A handshaken connection to the collector
struct Session<S> {
    writer: FrameWriter<WriteHalf<S>>,
    reply_reader: JoinHandle<()>,
    /// Cancelled once the collector's side of the connection is gone
    closed: CancellationToken,
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        self.reply_reader.abort();
    }
}

/// Background half of a shipper
///
/// Runs until every [`Shipper`] handle is dropped and the queue is drained,
/// or until its cancellation token fires.
pub struct ShipperTask<D: Dialer> {
    config: ShipperConfig,
    dialer: D,
    receiver: mpsc::Receiver<LogRecord>,
    /// Current session; swapped under the lock on redial
    connection: Mutex<Option<Session<D::Stream>>>,
    metrics: Arc<ShipperMetrics>,
    cancel: CancellationToken,
}

impl<D: Dialer> ShipperTask<D> {
    /// Stop the task when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ship queued records until shut down
    pub async fn run(mut self) -> ShipperMetricsSnapshot {
        tracing::info!(
            address = %self.config.address,
            app = %self.config.app,
            proc = %self.config.process,
            host = %self.config.host,
            "shipper starting"
        );

        if let Err(e) = self.connect().await {
            tracing::warn!(
                address = %self.config.address,
                error = %e,
                "initial connection failed, will redial on first record"
            );
        }

        loop {
            let record = tokio::select! {
                _ = self.cancel.cancelled() => break,
                record = self.receiver.recv() => match record {
                    Some(record) => record,
                    None => break,
                },
            };

            if !self.deliver(&record).await {
                break;
            }
        }

        self.connection.lock().await.take();

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            written = snapshot.written,
            dropped = snapshot.dropped,
            sent = snapshot.sent,
            reconnects = snapshot.reconnects,
            "shipper stopped"
        );
        snapshot
    }

    /// Send one record, redialing until it goes out
    ///
    /// Returns false if cancelled before the record could be sent.
    async fn deliver(&self, record: &LogRecord) -> bool {
        loop {
            match self.send(record).await {
                Ok(()) => {
                    self.metrics.sent.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(e) => {
                    self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(error = %e, "send failed, redialing");
                    if !self.redial().await {
                        return false;
                    }
                }
            }
        }
    }

    async fn send(&self, record: &LogRecord) -> Result<()> {
        let mut connection = self.connection.lock().await;
        let Some(session) = connection.as_mut() else {
            return Err(ClientError::NoConnection);
        };
        // Writes to a socket the peer has closed can still succeed locally
        if session.closed.is_cancelled() {
            connection.take();
            return Err(ClientError::NoConnection);
        }

        let frame = Frame::command([
            Bytes::from_static(b"PUB"),
            Bytes::from(record.timestamp.to_string()),
            Bytes::from(record.raw.clone()),
        ]);

        let result = match timeout(self.config.write_timeout, session.writer.write_frame(&frame)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ClientError::Timeout),
        };

        // A failed or partial write leaves the session unusable
        connection.take();
        result
    }

    /// Sleep and dial until connected; false if cancelled first
    async fn redial(&self) -> bool {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.config.redial_interval) => {}
            }

            match self.connect().await {
                Ok(()) => {
                    self.metrics.reconnects.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(address = %self.config.address, "reconnected to collector");
                    return true;
                }
                Err(e) => {
                    tracing::debug!(address = %self.config.address, error = %e, "redial failed");
                }
            }
        }
    }

    /// Dial, handshake and install a new session
    async fn connect(&self) -> Result<()> {
        let stream = timeout(self.config.connect_timeout, self.dialer.dial(&self.config.address))
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|source| ClientError::ConnectionFailed {
                address: self.config.address.clone(),
                source,
            })?;

        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);

        timeout(
            self.config.connect_timeout,
            self.handshake(&mut reader, &mut writer),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        let closed = CancellationToken::new();
        let session = Session {
            writer,
            reply_reader: tokio::spawn(read_replies(reader, closed.clone())),
            closed,
        };
        *self.connection.lock().await = Some(session);

        tracing::debug!(address = %self.config.address, "connected to collector");
        Ok(())
    }

    async fn handshake<R, W>(
        &self,
        reader: &mut FrameReader<R>,
        writer: &mut FrameWriter<W>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: tokio::io::AsyncWrite + Unpin,
    {
        let config = &self.config;

        writer
            .write_frame(&Frame::command([
                "AUTH".to_string(),
                config.username.clone(),
                config.password.clone(),
            ]))
            .await?;
        expect_ok(reader, "AUTH").await?;

        writer
            .write_frame(&Frame::command([
                "APP".to_string(),
                config.app.clone(),
                config.process.clone(),
                config.host.clone(),
            ]))
            .await?;
        expect_ok(reader, "APP").await
    }
}

/// Drain replies so the collector never blocks writing to us
///
/// Cancels `closed` when the connection ends.
async fn read_replies<R: AsyncRead + Unpin>(mut reader: FrameReader<R>, closed: CancellationToken) {
    let _closed = closed.drop_guard();
    loop {
        match reader.read_frame().await {
            Ok(Some(Frame::Error(msg))) => tracing::debug!(reply = %msg, "collector reported error"),
            Ok(Some(frame)) => tracing::trace!(?frame, "collector reply"),
            Ok(None) => {
                tracing::debug!("collector closed connection");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to read collector reply");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "shipper_test.rs"]
mod tests;
