//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler produces:
//!     → logging.rs (structured log events with request IDs)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
