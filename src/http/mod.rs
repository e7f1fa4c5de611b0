//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → relay.rs (method dispatch, peer exchange)
//!     → response.rs (outcome / error → status + body)
//!     → cors.rs headers on the way out
//!     → Send to client
//! ```

pub mod cors;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{Outcome, RelayError};
pub use server::{AppState, HttpServer};
