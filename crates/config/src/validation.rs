//! Configuration validation
//!
//! Checks values serde cannot reject on its own:
//! - The bind address is present
//! - Queue and buffer capacities are non-zero
//! - Agent timeouts are non-zero (port 0 is fine and binds an ephemeral port)

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_broker(config)?;
    validate_agent(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.address.trim().is_empty() {
        return Err(ConfigError::missing_field("server", "address"));
    }
    Ok(())
}

fn validate_broker(config: &Config) -> Result<()> {
    if config.broker.queue_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "broker",
            "queue_capacity",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_agent(config: &Config) -> Result<()> {
    let agent = &config.agent;
    if agent.buffer_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "agent",
            "buffer_capacity",
            "must be greater than 0",
        ));
    }

    for (field, value) in [
        ("connect_timeout", agent.connect_timeout),
        ("write_timeout", agent.write_timeout),
    ] {
        if value.is_zero() {
            return Err(ConfigError::invalid_value("agent", field, "must be greater than 0"));
        }
    }
    Ok(())
}
