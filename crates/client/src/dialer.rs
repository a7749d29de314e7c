//! Transport dialing
//!
//! The shipper reaches the collector through a [`Dialer`] so reconnect
//! behaviour can be exercised against in-memory streams.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens byte streams to a collector
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    async fn dial(&self, address: &str) -> io::Result<Self::Stream>;
}

/// Production dialer over TCP
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// Idle time before keepalive probes (None disables keepalive)
    pub keepalive: Option<Duration>,
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self {
            keepalive: Some(Duration::from_secs(30)),
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, address: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(address).await?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }

        if let Some(idle) = self.keepalive {
            let keepalive = TcpKeepalive::new().with_time(idle);
            if let Err(e) = SockRef::from(&stream).set_tcp_keepalive(&keepalive) {
                tracing::debug!(error = %e, "failed to set TCP keep-alive");
            }
        }

        Ok(stream)
    }
}
