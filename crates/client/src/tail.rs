//! Tail client
//!
//! Subscribes to a collector and yields matching log lines as they arrive.
//!
//! ```ignore
//! let mut tail = TailClient::connect("localhost:7701").await?;
//! tail.auth("alice", "secret").await?;
//! tail.subscribe("web", "*", "*").await?;
//! while let Some(delivery) = tail.next_delivery().await? {
//!     println!("{} {}", delivery.topic, delivery.line);
//! }
//! ```

use logwire_protocol::{Frame, FrameReader, FrameWriter, Message, Topic};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

use crate::error::{ClientError, Result};
use crate::reply::expect_ok;

/// One log line received from a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(flatten)]
    pub topic: Topic,
    pub line: String,
}

impl From<Message> for Delivery {
    fn from(message: Message) -> Self {
        Self {
            timestamp: message.record.timestamp,
            topic: message.topic,
            line: message.record.raw,
        }
    }
}

/// Subscriber connection to a collector
pub struct TailClient<S = TcpStream> {
    reader: FrameReader<ReadHalf<S>>,
    writer: FrameWriter<WriteHalf<S>>,
}

impl TailClient<TcpStream> {
    /// Connect over TCP
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| ClientError::ConnectionFailed {
                address: address.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }
}

impl<S: AsyncRead + AsyncWrite> TailClient<S> {
    pub fn from_stream(stream: S) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
        }
    }

    /// Select the namespace to read from
    pub async fn auth(&mut self, username: &str, password: &str) -> Result<()> {
        self.call(["AUTH", username, password], "AUTH").await
    }

    /// Subscribe with glob patterns for app, proc and host
    ///
    /// May be called more than once; deliveries from all subscriptions are
    /// interleaved on this connection.
    pub async fn subscribe(&mut self, app: &str, process: &str, host: &str) -> Result<()> {
        self.call(["SUB", app, process, host], "SUB").await
    }

    /// Wait for the next delivered line
    ///
    /// Returns `Ok(None)` when the collector closes the connection.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the collector sends an error reply, and a
    /// protocol error for frames that are not deliveries.
    pub async fn next_delivery(&mut self) -> Result<Option<Delivery>> {
        match self.reader.read_frame().await? {
            None => Ok(None),
            Some(Frame::Error(msg)) => Err(ClientError::rejected("SUB", msg)),
            Some(frame) => Ok(Some(Message::from_frame(frame)?.into())),
        }
    }

    /// Send QUIT and wait for the acknowledgement
    pub async fn quit(mut self) -> Result<()> {
        self.writer.write_frame(&Frame::command(["QUIT"])).await?;
        // Deliveries already in flight may precede the +OK
        loop {
            match self.reader.read_frame().await? {
                Some(frame) if frame.is_ok() => return Ok(()),
                Some(Frame::Error(msg)) => return Err(ClientError::rejected("QUIT", msg)),
                Some(_) => continue,
                None => return Ok(()),
            }
        }
    }

    async fn call<const N: usize>(&mut self, parts: [&str; N], command: &'static str) -> Result<()> {
        let frame = Frame::command(parts.map(str::to_owned));
        self.writer.write_frame(&frame).await?;
        expect_ok(&mut self.reader, command).await
    }
}

#[cfg(test)]
#[path = "tail_test.rs"]
mod tests;
