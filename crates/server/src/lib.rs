//! logwire server - the RESP log collector
//!
//! Clients connect over TCP and speak a small command set:
//!
//! | Command | Effect |
//! |---|---|
//! | `AUTH <user> <pass>` | select the user namespace |
//! | `APP <app> <proc> <host>` | bind the publishing topic |
//! | `PUB <nanos> <line>` | publish a line under the bound topic |
//! | `SUB <app> <proc> <host>` | stream lines whose topic matches the globs |
//! | `QUIT` | end the connection |
//!
//! Published lines fan out through the namespace's broker to every matching
//! subscription, and optionally to an external [`Substrate`].

mod command;
mod connection;
mod error;
mod metrics;
mod server;
mod substrate;

pub use command::{Command, CommandError};
pub use connection::{
    Connection, ConnectionContext, ConnectionState, FORBIDDEN_ARGUMENT, NO_APP_BOUND,
};
pub use error::{Result, ServerError};
pub use metrics::{ServerMetrics, ServerMetricsSnapshot};
pub use server::{CollectorConfig, CollectorServer};
pub use substrate::{Substrate, SubstrateError};
