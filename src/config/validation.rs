//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses (bind address, peer `host:port`, metrics endpoint)
//! - Validate value ranges (timeouts and buffer sizes > 0)
//! - Validate the log level against the tracing levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidSocketAddr { field: &'static str, value: String },

    #[error("peer.address: expected host:port, got '{0}'")]
    InvalidPeerAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.log_level: expected one of trace, debug, info, warn, error, got '{0}'")]
    InvalidLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    // Mock mode never dials, so a placeholder address is acceptable there.
    if !config.peer.mock_mode && !is_host_port(&config.peer.address) {
        errors.push(ValidationError::InvalidPeerAddress(config.peer.address.clone()));
    }

    if config.peer.max_response_bytes == 0 {
        errors.push(ValidationError::Zero("peer.max_response_bytes"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_ms"));
    }
    if config.timeouts.deadline_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.deadline_ms"));
    }
    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("http.max_body_bytes"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0)
        }
        None => false,
    }
}
