//! Configuration loading from disk and the command line.
//!
//! Precedence: command-line override > config file > built-in default.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::peer::FramingPolicy;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line. `None` leaves the file/default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub peer_address: Option<String>,
    pub mock_mode: Option<bool>,
    pub framing: Option<FramingPolicy>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(addr) = &self.bind_address {
            config.listener.bind_address = addr.clone();
        }
        if let Some(addr) = &self.peer_address {
            config.peer.address = addr.clone();
        }
        if let Some(mock) = self.mock_mode {
            config.peer.mock_mode = mock;
        }
        if let Some(framing) = self.framing {
            config.peer.framing = framing;
        }
    }
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Build the effective configuration: optional TOML file, then overrides,
/// then validation.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => RelayConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
