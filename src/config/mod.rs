//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply CLI overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::HttpConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PeerConfig;
pub use schema::RelayConfig;
pub use schema::TimeoutConfig;
