//! RESP frames
//!
//! The collector speaks RESP2. Clients send commands as arrays of bulk
//! strings; the collector answers with simple strings, errors, integers,
//! bulk strings or arrays.
//!
//! # Wire Format
//!
//! ```text
//! +OK\r\n                      simple string
//! -ERR message\r\n             error
//! :1000\r\n                    integer
//! $5\r\nhello\r\n              bulk string ($-1 is null)
//! *2\r\n$3\r\nSUB\r\n...       array (*-1 is null)
//! ```
//!
//! Decoding is incremental: `Frame::parse` returns `Ok(None)` until a full
//! frame is buffered, so callers can keep reading into the same buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{MAX_ARRAY_LEN, MAX_BULK_LEN, MAX_DEPTH, MAX_LINE_LEN, ProtocolError, Result};

const CRLF: &[u8] = b"\r\n";

/// A single RESP value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// `+OK`
    pub fn ok() -> Self {
        Frame::Simple("OK".into())
    }

    /// Error reply
    pub fn error(msg: impl Into<String>) -> Self {
        Frame::Error(msg.into())
    }

    /// Bulk string reply
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Frame::Bulk(data.into())
    }

    /// Build a command array from its parts, each sent as a bulk string
    pub fn command<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Frame::Array(parts.into_iter().map(|p| Frame::Bulk(p.into())).collect())
    }

    /// Text content of a simple or bulk string
    ///
    /// Returns None for other frame types and for non-UTF-8 bulk strings.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Simple(s) => Some(s),
            Frame::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Integer value, accepting integers sent as text
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Frame::Integer(n) => Some(*n),
            other => other.as_text()?.parse().ok(),
        }
    }

    /// True for `+OK`
    pub fn is_ok(&self) -> bool {
        matches!(self, Frame::Simple(s) if s == "OK")
    }

    /// Encode this frame into a buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                buf.put_u8(b'+');
                put_line_safe(s, buf);
            }
            Frame::Error(s) => {
                buf.put_u8(b'-');
                put_line_safe(s, buf);
            }
            Frame::Integer(n) => {
                buf.put_u8(b':');
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            Frame::Bulk(data) => {
                buf.put_u8(b'$');
                buf.put_slice(data.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            Frame::Null => buf.put_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                buf.put_u8(b'*');
                buf.put_slice(items.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for item in items {
                    item.encode(buf);
                }
            }
        }
    }

    /// Encode to a standalone buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Try to decode one frame from the front of `buf`
    ///
    /// Returns:
    /// - Ok(Some((frame, consumed))) if a complete frame is buffered
    /// - Ok(None) if more data is needed
    /// - Err if the bytes are not valid RESP
    ///
    /// The buffer is not modified; the caller advances past `consumed`.
    pub fn parse(buf: &[u8]) -> Result<Option<(Frame, usize)>> {
        parse_at(buf, 0, 0)
    }
}

/// Simple strings and errors are line-delimited; line breaks inside would
/// desynchronize the peer, so they are flattened to spaces.
fn put_line_safe(s: &str, buf: &mut BytesMut) {
    if s.contains(['\r', '\n']) {
        buf.put_slice(s.replace(['\r', '\n'], " ").as_bytes());
    } else {
        buf.put_slice(s.as_bytes());
    }
    buf.put_slice(CRLF);
}

fn parse_at(buf: &[u8], pos: usize, depth: usize) -> Result<Option<(Frame, usize)>> {
    let Some(&type_byte) = buf.get(pos) else {
        return Ok(None);
    };
    let Some((line, after_line)) = read_line(buf, pos + 1)? else {
        return Ok(None);
    };

    match type_byte {
        b'+' => Ok(Some((Frame::Simple(line_to_string(line)), after_line))),
        b'-' => Ok(Some((Frame::Error(line_to_string(line)), after_line))),
        b':' => Ok(Some((Frame::Integer(parse_int(line)?), after_line))),
        b'$' => {
            let len = parse_int(line)?;
            if len < 0 {
                return Ok(Some((Frame::Null, after_line)));
            }
            let len = len as usize;
            if len > MAX_BULK_LEN {
                return Err(ProtocolError::too_large(len, MAX_BULK_LEN));
            }
            let end = after_line + len;
            if buf.len() < end + CRLF.len() {
                return Ok(None);
            }
            if &buf[end..end + CRLF.len()] != CRLF {
                return Err(ProtocolError::MissingTerminator);
            }
            let data = Bytes::copy_from_slice(&buf[after_line..end]);
            Ok(Some((Frame::Bulk(data), end + CRLF.len())))
        }
        b'*' => {
            let count = parse_int(line)?;
            if count < 0 {
                return Ok(Some((Frame::Null, after_line)));
            }
            if depth >= MAX_DEPTH {
                return Err(ProtocolError::NestingTooDeep { max: MAX_DEPTH });
            }
            let count = count as usize;
            if count > MAX_ARRAY_LEN {
                return Err(ProtocolError::too_large(count, MAX_ARRAY_LEN));
            }
            let mut items = Vec::with_capacity(count);
            let mut cursor = after_line;
            for _ in 0..count {
                match parse_at(buf, cursor, depth + 1)? {
                    Some((item, next)) => {
                        items.push(item);
                        cursor = next;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Frame::Array(items), cursor)))
        }
        other => Err(ProtocolError::InvalidFrameType(other)),
    }
}

/// Find the CRLF-terminated line starting at `start`
///
/// Returns the line contents and the position after the terminator.
fn read_line(buf: &[u8], start: usize) -> Result<Option<(&[u8], usize)>> {
    let rest = buf.get(start..).unwrap_or_default();
    match rest.windows(2).position(|w| w == CRLF) {
        Some(idx) => Ok(Some((&rest[..idx], start + idx + CRLF.len()))),
        None if rest.len() > MAX_LINE_LEN => Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN }),
        None => Ok(None),
    }
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ProtocolError::InvalidInteger(String::from_utf8_lossy(line).into_owned()))
}

fn line_to_string(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}
