//! Log records and the messages that carry them to subscribers

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{Frame, ProtocolError, Result, Topic};

/// A single log line with its origin timestamp in nanoseconds since the epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: i64,
    pub raw: String,
}

impl LogRecord {
    pub fn new(timestamp: i64, raw: impl Into<String>) -> Self {
        Self {
            timestamp,
            raw: raw.into(),
        }
    }

    /// Stamp a line with the current wall-clock time
    pub fn now(raw: impl Into<String>) -> Self {
        Self::new(now_nanos(), raw)
    }
}

/// Current time in nanoseconds since the Unix epoch
///
/// Clocks before 1970 yield 0; times past the i64 range saturate.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// A record paired with the topic it was published on
///
/// This is the unit the broker hands to each matching subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: Topic,
    pub record: LogRecord,
}

impl Message {
    pub fn new(topic: Topic, record: LogRecord) -> Self {
        Self { topic, record }
    }

    /// Encode as a subscription delivery
    ///
    /// `[integer timestamp, simple app, simple proc, simple host, bulk line]`
    pub fn to_frame(&self) -> Frame {
        Frame::Array(vec![
            Frame::Integer(self.record.timestamp),
            Frame::Simple(self.topic.app().to_owned()),
            Frame::Simple(self.topic.process().to_owned()),
            Frame::Simple(self.topic.host().to_owned()),
            Frame::bulk(self.record.raw.clone()),
        ])
    }

    /// Decode a subscription delivery
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedFrame` if the frame is not a 5-element delivery
    /// array with the expected element types.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let items = match frame {
            Frame::Array(items) if items.len() == 5 => items,
            Frame::Array(items) => {
                return Err(ProtocolError::unexpected(format!(
                    "delivery has {} elements, expected 5",
                    items.len()
                )));
            }
            other => {
                return Err(ProtocolError::unexpected(format!(
                    "delivery is not an array: {other:?}"
                )));
            }
        };

        let timestamp = match &items[0] {
            Frame::Integer(ts) => *ts,
            _ => return Err(ProtocolError::unexpected("delivery timestamp is not an integer")),
        };
        let field = |idx: usize, name: &str| -> Result<String> {
            items[idx]
                .as_text()
                .map(str::to_owned)
                .ok_or_else(|| ProtocolError::unexpected(format!("delivery {name} is not text")))
        };

        let topic = Topic::unchecked(field(1, "app")?, field(2, "proc")?, field(3, "host")?);
        let raw = match &items[4] {
            Frame::Bulk(data) => String::from_utf8_lossy(data).into_owned(),
            Frame::Simple(s) => s.clone(),
            _ => return Err(ProtocolError::unexpected("delivery line is not a string")),
        };

        Ok(Self::new(topic, LogRecord::new(timestamp, raw)))
    }
}
