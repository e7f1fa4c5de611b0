//! The relay handler.
//!
//! One inbound HTTP request maps to at most one outbound TCP exchange:
//!
//! ```text
//! OPTIONS → Preflight                          (no peer contact)
//! GET     → probe peer, or mock availability
//! POST    → read body → frame → exchange, or mock reply
//! other   → 405                                (no peer contact)
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use std::time::Instant;

use crate::http::request::request_id_of;
use crate::http::response::{Outcome, RelayError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::peer::{exchange, PeerReply};

/// Entry point for every path and method.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id_of(&request);
    let method = request.method().clone();

    tracing::debug!(request_id = %request_id, method = %method, path = %request.uri().path(), "Relay request");

    let result = match method {
        Method::OPTIONS => Ok(Outcome::Preflight),
        Method::GET => check_availability(&state).await,
        Method::POST => relay_frame(&state, request.into_body()).await,
        _ => Err(RelayError::MethodNotAllowed(method.clone())),
    };

    let (kind, response) = match result {
        Ok(outcome) => {
            tracing::debug!(request_id = %request_id, outcome = outcome.kind(), "Relay request complete");
            (outcome.kind(), outcome.into_response())
        }
        Err(err) => {
            tracing::warn!(request_id = %request_id, method = %method, error = %err, "Relay request failed");
            (err.kind(), err.into_response())
        }
    };

    metrics::record_request(&method, response.status().as_u16(), kind, start);
    response
}

async fn check_availability(state: &AppState) -> Result<Outcome, RelayError> {
    if state.config.peer.mock_mode {
        return Ok(Outcome::Available { mock: true });
    }

    let target = state.peer.resolve();
    exchange::probe(&target).await?;

    tracing::debug!(peer = %target.address, "Peer accepted probe connection");
    Ok(Outcome::Available { mock: false })
}

async fn relay_frame(state: &AppState, body: Body) -> Result<Outcome, RelayError> {
    if state.config.peer.mock_mode {
        tracing::info!("Mock mode: answering frame without contacting peer");
        return Ok(Outcome::Mocked);
    }

    let payload = axum::body::to_bytes(body, state.config.http.max_body_bytes)
        .await
        .map_err(|e| RelayError::BadRequest(e.to_string()))?;
    let frame = state.config.peer.framing.apply(payload);

    let target = state.peer.resolve();
    tracing::info!(peer = %target.address, frame_len = frame.len(), "Sending frame to peer");
    tracing::debug!(frame = %String::from_utf8_lossy(&frame), "Frame contents");

    let reply = exchange::exchange(&target, &frame, state.config.peer.max_response_bytes).await?;
    match &reply {
        PeerReply::Data(bytes) => {
            tracing::info!(peer = %target.address, reply_len = bytes.len(), "Received peer reply")
        }
        PeerReply::Silent => {
            tracing::info!(peer = %target.address, "Peer closed without replying")
        }
    }

    Ok(Outcome::Relayed(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::http::response::{AVAILABLE_MOCK, MOCK_REPLY};
    use crate::http::HttpServer;
    use crate::peer::{PeerTarget, ResolvePeer};
    use axum::http::{header, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Resolver that counts lookups; a lookup is required before any dial.
    #[derive(Default)]
    struct CountingPeer {
        lookups: AtomicUsize,
    }

    impl ResolvePeer for CountingPeer {
        fn resolve(&self) -> PeerTarget {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            PeerTarget {
                address: "127.0.0.1:1".into(),
                connect_timeout: std::time::Duration::from_millis(200),
                io_deadline: std::time::Duration::from_millis(200),
            }
        }
    }

    fn router(mock_mode: bool, peer: Arc<CountingPeer>) -> axum::Router {
        let mut config = RelayConfig::default();
        config.peer.mock_mode = mock_mode;
        HttpServer::with_resolver(config, peer).router()
    }

    fn request(method: Method, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn options_is_preflight_without_peer_contact() {
        let peer = Arc::new(CountingPeer::default());
        let response = router(false, peer.clone())
            .oneshot(request(Method::OPTIONS, ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert!(body_text(response).await.is_empty());
        assert_eq!(peer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_methods_are_rejected_without_peer_contact() {
        let peer = Arc::new(CountingPeer::default());
        for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let response = router(false, peer.clone())
                .oneshot(request(method.clone(), "[01]"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_cors(&response);
        }
        assert_eq!(peer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mock_post_ignores_body() {
        let peer = Arc::new(CountingPeer::default());
        for body in ["", "[01c012]", "not a frame at all"] {
            let response = router(true, peer.clone())
                .oneshot(request(Method::POST, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_cors(&response);
            assert_eq!(body_text(response).await, MOCK_REPLY);
        }
        assert_eq!(peer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mock_get_reports_available() {
        let peer = Arc::new(CountingPeer::default());
        let response = router(true, peer.clone())
            .oneshot(request(Method::GET, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, AVAILABLE_MOCK);
        assert_eq!(peer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sub_paths_reach_the_handler() {
        let peer = Arc::new(CountingPeer::default());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/robot/frame")
            .body(Body::empty())
            .unwrap();
        let response = router(false, peer).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_bad_request() {
        let peer = Arc::new(CountingPeer::default());
        let mut config = RelayConfig::default();
        config.http.max_body_bytes = 4;
        let app = HttpServer::with_resolver(config, peer.clone()).router();

        let response = app.oneshot(request(Method::POST, "[0123456789]")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        assert!(body_text(response).await.starts_with("Error reading request body: "));
        assert_eq!(peer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let peer = Arc::new(CountingPeer::default());
        let response = router(true, peer)
            .oneshot(request(Method::GET, ""))
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
