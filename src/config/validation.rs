//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and the relation
//! between the connection cap and the admission capacity. All errors are
//! collected, not just the first.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("listener.max_connections ({max_connections}) must be greater than processing.concurrency ({concurrency})")]
    ConnectionCapTooSmall {
        max_connections: usize,
        concurrency: usize,
    },

    #[error("response.gzip_compression must be between 0 and 9, got {0}")]
    GzipLevel(u32),

    #[error("response.ttl_secs must be at most {MAX_TTL_SECS}, got {0}")]
    TtlTooLarge(u64),
}

/// Ten years. Keeps `Expires` far from the end of the HTTP date range.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.processing.concurrency == 0 {
        errors.push(ValidationError::Zero("processing.concurrency"));
    } else if config.listener.max_connections <= config.processing.concurrency {
        errors.push(ValidationError::ConnectionCapTooSmall {
            max_connections: config.listener.max_connections,
            concurrency: config.processing.concurrency,
        });
    }

    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.read_secs"));
    }
    if config.timeouts.write_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.write_secs"));
    }

    if config.response.gzip_compression > 9 {
        errors.push(ValidationError::GzipLevel(config.response.gzip_compression));
    }

    if config.response.ttl_secs > MAX_TTL_SECS {
        errors.push(ValidationError::TtlTooLarge(config.response.ttl_secs));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
