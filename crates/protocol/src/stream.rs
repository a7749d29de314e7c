//! Async framing over byte streams
//!
//! `FrameReader` buffers reads until a full RESP frame is available;
//! `FrameWriter` encodes and flushes one frame per call. Both are generic
//! over tokio's I/O traits so they work on TCP halves and in-memory pipes.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Frame, ProtocolError, Result};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Reads RESP frames from an async byte stream
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the peer closes the stream between frames.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if the stream closes mid-frame, or a decode
    /// error if the bytes are not valid RESP.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some((frame, consumed)) = Frame::parse(&self.buf)? {
                self.buf.advance(consumed);
                return Ok(Some(frame));
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(ProtocolError::UnexpectedEof);
            }
        }
    }
}

/// Writes RESP frames to an async byte stream
pub struct FrameWriter<W> {
    inner: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Encode, write and flush a single frame
    pub async fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        self.buf.clear();
        frame.encode(&mut self.buf);
        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await
    }
}
