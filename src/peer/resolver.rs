//! Peer endpoint resolution.
//!
//! The relay handler never reads the peer address or timeouts from config
//! directly; it asks a [`ResolvePeer`] for a [`PeerTarget`] per request.

use std::time::Duration;

use crate::config::{PeerConfig, TimeoutConfig};

/// Where and how patiently to dial the peer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTarget {
    /// `host:port` to connect to.
    pub address: String,
    /// Bound on TCP connection establishment.
    pub connect_timeout: Duration,
    /// Combined write + read deadline, started once the connection is up.
    pub io_deadline: Duration,
}

/// Supplies the peer endpoint for each exchange.
pub trait ResolvePeer: Send + Sync {
    fn resolve(&self) -> PeerTarget;
}

/// A single fixed peer taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticPeer {
    target: PeerTarget,
}

impl StaticPeer {
    pub fn new(target: PeerTarget) -> Self {
        Self { target }
    }

    pub fn from_config(peer: &PeerConfig, timeouts: &TimeoutConfig) -> Self {
        Self::new(PeerTarget {
            address: peer.address.clone(),
            connect_timeout: timeouts.connect(),
            io_deadline: timeouts.deadline(),
        })
    }
}

impl ResolvePeer for StaticPeer {
    fn resolve(&self) -> PeerTarget {
        self.target.clone()
    }
}
