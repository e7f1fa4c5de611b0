//! Permissive cross-origin headers.
//!
//! The relay is called from browser frontends on other origins, so every
//! response, including errors and middleware-generated ones, carries the
//! same three headers. Preflight itself is answered by the relay handler.

use axum::http::{header, HeaderName, HeaderValue};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// The CORS headers attached to every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ),
    ]
}
