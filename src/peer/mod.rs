//! Peer (robot) subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound frame
//!     → framing.rs (pass-through or bracket framing)
//!     → resolver.rs (address + timeouts for this request)
//!     → exchange.rs (connect → write → single read → close)
//!     → PeerReply back to the relay handler
//! ```
//!
//! # Design Decisions
//! - One TCP connection per request; nothing is pooled or shared
//! - Every network step has a deadline
//! - Replies are never reassembled; the read buffer bounds the reply

pub mod exchange;
pub mod framing;
pub mod resolver;

pub use exchange::{PeerError, PeerReply};
pub use framing::FramingPolicy;
pub use resolver::{PeerTarget, ResolvePeer, StaticPeer};
