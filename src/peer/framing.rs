//! Frame normalization applied before a payload is written to the peer.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// How request bodies are framed on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingPolicy {
    /// Forward the body byte-for-byte.
    #[default]
    PassThrough,
    /// Ensure the payload starts with `[` and ends with `]`.
    Bracket,
}

impl FramingPolicy {
    /// Frame a payload according to this policy.
    pub fn apply(self, payload: Bytes) -> Bytes {
        match self {
            FramingPolicy::PassThrough => payload,
            FramingPolicy::Bracket => bracket(payload),
        }
    }
}

impl std::str::FromStr for FramingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass-through" | "pass_through" => Ok(FramingPolicy::PassThrough),
            "bracket" => Ok(FramingPolicy::Bracket),
            other => Err(format!(
                "unknown framing '{other}' (expected 'pass-through' or 'bracket')"
            )),
        }
    }
}

fn bracket(payload: Bytes) -> Bytes {
    let open = !payload.starts_with(b"[");
    let close = !payload.ends_with(b"]");
    if !open && !close {
        return payload;
    }

    let mut framed = Vec::with_capacity(payload.len() + 2);
    if open {
        framed.push(b'[');
    }
    framed.extend_from_slice(&payload);
    if close {
        framed.push(b']');
    }
    Bytes::from(framed)
}
