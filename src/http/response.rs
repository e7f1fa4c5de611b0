//! Response construction.
//!
//! # Responsibilities
//! - Turn relay outcomes into HTTP responses
//! - Map peer and body errors to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Bodies are plain text; error bodies carry the underlying cause
//! - A peer that closes without replying is a 200, not an error
//! - CORS headers are added by a layer, not here (see `cors.rs`)

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::peer::{PeerError, PeerReply};

pub const AVAILABLE: &str = "Robot is available";
pub const AVAILABLE_MOCK: &str = "Robot is available (MOCK MODE)";
pub const MOCK_REPLY: &str = "Robot response: [01c01200300230005001840203]";
pub const NO_RESPONSE: &str = "Frame sent successfully, but no response received";

/// Request-level failure, surfaced once to the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound body could not be read.
    #[error("Error reading request body: {0}")]
    BadRequest(String),

    /// Connecting to the peer failed or timed out.
    #[error("Could not connect to robot: {0}")]
    PeerUnavailable(String),

    /// Writing the frame failed after the connection was established.
    #[error("Error sending frame to robot: {0}")]
    TransmitFailure(String),

    /// Reading the reply failed with something other than a clean close.
    #[error("Error reading response from robot: {0}")]
    ResponseReadFailure(String),

    #[error("Method not allowed")]
    MethodNotAllowed(Method),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::PeerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::TransmitFailure(_) | RelayError::ResponseReadFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Metrics/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BadRequest(_) => "bad_request",
            RelayError::PeerUnavailable(_) => "peer_unavailable",
            RelayError::TransmitFailure(_) => "transmit_failure",
            RelayError::ResponseReadFailure(_) => "read_failure",
            RelayError::MethodNotAllowed(_) => "method_not_allowed",
        }
    }
}

impl From<PeerError> for RelayError {
    fn from(err: PeerError) -> Self {
        match err {
            err @ PeerError::Connect { .. } => RelayError::PeerUnavailable(err.to_string()),
            PeerError::Transmit(e) => RelayError::TransmitFailure(e.to_string()),
            PeerError::Read(e) => RelayError::ResponseReadFailure(e.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        text(self.status(), Body::from(self.to_string()))
    }
}

/// Successful terminal state of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// CORS preflight answered.
    Preflight,
    /// The peer accepted a probe connection (or mock mode is on).
    Available { mock: bool },
    /// Mock mode answered a frame.
    Mocked,
    /// The peer answered a frame.
    Relayed(PeerReply),
}

impl Outcome {
    /// Metrics/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Available { mock: false } => "available",
            Outcome::Available { mock: true } => "available_mock",
            Outcome::Mocked => "mocked",
            Outcome::Relayed(PeerReply::Data(_)) => "relayed",
            Outcome::Relayed(PeerReply::Silent) => "no_response",
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let body = match self {
            Outcome::Preflight => return StatusCode::OK.into_response(),
            Outcome::Available { mock: false } => Body::from(AVAILABLE),
            Outcome::Available { mock: true } => Body::from(AVAILABLE_MOCK),
            Outcome::Mocked => Body::from(MOCK_REPLY),
            Outcome::Relayed(PeerReply::Data(bytes)) => Body::from(bytes),
            Outcome::Relayed(PeerReply::Silent) => Body::from(NO_RESPONSE),
        };
        text(StatusCode::OK, body)
    }
}

fn text(status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
