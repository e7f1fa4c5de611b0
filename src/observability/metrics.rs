//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): latency by method, outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder (tests, metrics disabled) every call is a no-op
//! - The Prometheus exporter serves its own scrape endpoint
//! - Label values come from fixed sets; unsupported methods share `other`

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Bounded `method` label value.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::OPTIONS => "OPTIONS",
        _ => "other",
    }
}

/// Record one finished relay request.
pub fn record_request(method: &Method, status: u16, outcome: &'static str, start: Instant) {
    let method = method_label(method);
    ::metrics::counter!(
        "relay_requests_total",
        "method" => method,
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    ::metrics::histogram!(
        "relay_request_duration_seconds",
        "method" => method,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}
