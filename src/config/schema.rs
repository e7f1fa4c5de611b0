//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::peer::FramingPolicy;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single TCP peer frames are relayed to.
    pub peer: PeerConfig,

    /// Timeout configuration for peer I/O.
    pub timeouts: TimeoutConfig,

    /// Inbound HTTP limits.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Peer (robot) configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PeerConfig {
    /// Peer address as `host:port`.
    pub address: String,

    /// Fabricate responses instead of contacting the peer.
    pub mock_mode: bool,

    /// How request bodies are framed before being written to the peer.
    pub framing: FramingPolicy,

    /// Size of the single read buffer; longer replies are truncated.
    pub max_response_bytes: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            address: "100.105.5.12:8000".to_string(),
            mock_mode: false,
            framing: FramingPolicy::PassThrough,
            max_response_bytes: 1024,
        }
    }
}

/// Timeout configuration for peer operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect timeout in milliseconds.
    pub connect_ms: u64,

    /// Combined write + read deadline in milliseconds, started after connect.
    pub deadline_ms: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 3_000,
            deadline_ms: 5_000,
        }
    }
}

/// Inbound HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
