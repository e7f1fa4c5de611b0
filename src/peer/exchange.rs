//! Short-lived TCP exchanges with the peer.
//!
//! # Responsibilities
//! - Dial the peer with a bounded connect timeout
//! - Write one frame and perform exactly one bounded read
//! - Release the connection on every exit path
//!
//! # Design Decisions
//! - One deadline covers both the write and the read
//! - Timeout expiry surfaces as `io::ErrorKind::TimedOut` inside the
//!   failing stage, so callers map errors by stage, not by cause
//! - Clean end-of-stream before any byte is a reply, not an error

use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};

use axum::body::Bytes;

use crate::peer::resolver::PeerTarget;

/// Failure of one stage of a peer exchange.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("write failed: {0}")]
    Transmit(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),
}

/// What the peer sent back for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply {
    /// Bytes from a single read, at most the configured buffer size.
    Data(Bytes),
    /// The peer closed the stream without sending anything.
    Silent,
}

fn timed_out(stage: &str, after: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{stage} timed out after {}ms", after.as_millis()),
    )
}

/// Open a connection, bounded by the target's connect timeout.
pub async fn connect(target: &PeerTarget) -> Result<TcpStream, PeerError> {
    let result = match timeout(target.connect_timeout, TcpStream::connect(&target.address)).await {
        Ok(result) => result,
        Err(_) => Err(timed_out("connect", target.connect_timeout)),
    };

    result.map_err(|source| PeerError::Connect {
        address: target.address.clone(),
        source,
    })
}

/// Check that the peer accepts connections. The connection is closed at once.
pub async fn probe(target: &PeerTarget) -> Result<(), PeerError> {
    let stream = connect(target).await?;
    drop(stream);
    Ok(())
}

/// Send one frame and read one reply of at most `max_response` bytes.
pub async fn exchange(
    target: &PeerTarget,
    frame: &[u8],
    max_response: usize,
) -> Result<PeerReply, PeerError> {
    let mut stream = connect(target).await?;
    let deadline = Instant::now() + target.io_deadline;

    match timeout_at(deadline, stream.write_all(frame)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(PeerError::Transmit(e)),
        Err(_) => return Err(PeerError::Transmit(timed_out("write", target.io_deadline))),
    }

    let mut buf = vec![0u8; max_response];
    let n = match timeout_at(deadline, stream.read(&mut buf)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(PeerError::Read(e)),
        Err(_) => return Err(PeerError::Read(timed_out("read", target.io_deadline))),
    };

    if n == 0 {
        return Ok(PeerReply::Silent);
    }

    buf.truncate(n);
    Ok(PeerReply::Data(Bytes::from(buf)))
}
