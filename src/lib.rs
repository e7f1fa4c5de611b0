//! HTTP-to-TCP relay for a single robot controller.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod peer;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
