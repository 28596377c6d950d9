//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    normalize(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Treat empty optional strings as unset.
pub fn normalize(config: &mut GatewayConfig) {
    let security = &mut config.security;
    if security.secret.as_deref().is_some_and(str::is_empty) {
        security.secret = None;
    }
    if security.allow_origin.as_deref().is_some_and(str::is_empty) {
        security.allow_origin = None;
    }
}
