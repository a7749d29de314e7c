//! logwire client library
//!
//! Two clients for the logwire collector:
//!
//! - [`Shipper`] - ships an application's log lines to a collector. Writes
//!   never block: lines go into a bounded buffer and a background task
//!   publishes them, redialing whenever the connection drops.
//! - [`TailClient`] - subscribes with glob patterns and yields matching
//!   lines as [`Delivery`] values.
//!
//! # Quick Start
//!
//! ```ignore
//! use logwire_client::{Shipper, ShipperConfig};
//!
//! let config = ShipperConfig::new("localhost:7701", "web").with_process("api");
//! let (shipper, task) = Shipper::new(config);
//! tokio::spawn(task.run());
//!
//! shipper.write_line("request served")?;
//! ```

mod config;
mod dialer;
mod error;
mod reply;
mod shipper;
mod tail;

pub use config::{DEFAULT_BUFFER_CAPACITY, ShipperConfig, URL_SCHEME};
pub use dialer::{Dialer, TcpDialer};
pub use error::{ClientError, Result};
pub use shipper::{Shipper, ShipperMetrics, ShipperMetricsSnapshot, ShipperTask};
pub use tail::{Delivery, TailClient};
