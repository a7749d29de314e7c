//! Reading command replies

use logwire_protocol::{Frame, FrameReader};
use tokio::io::AsyncRead;

use crate::error::{ClientError, Result};

/// Read one reply and require it to be `+OK`
pub(crate) async fn expect_ok<R>(reader: &mut FrameReader<R>, command: &'static str) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_frame().await? {
        Some(frame) if frame.is_ok() => Ok(()),
        Some(Frame::Error(msg)) => Err(ClientError::rejected(command, msg)),
        Some(other) => Err(ClientError::rejected(command, format!("{other:?}"))),
        None => Err(ClientError::ConnectionClosed),
    }
}
