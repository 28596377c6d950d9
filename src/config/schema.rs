//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the image gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Processing admission settings.
    pub processing: ProcessingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response encoding (caching, compression, ETag).
    pub response: ResponseConfig,

    /// Shared secret and CORS.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Source image download settings.
    pub download: DownloadConfig,
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrently accepted connections.
    /// Must be larger than `processing.concurrency` so that excess requests
    /// queue at the admission gate instead of at the socket.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: ProcessingConfig::default().concurrency * 10,
        }
    }
}

/// Processing admission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of requests allowed into download/processing at once.
    pub concurrency: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: available_cpus() * 2,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to read request headers, in seconds.
    pub read_secs: u64,

    /// Per-request processing budget in seconds, counted from admission.
    pub write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            write_secs: 10,
        }
    }
}

/// Response encoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Cache lifetime advertised to clients, in seconds.
    pub ttl_secs: u64,

    /// Gzip level (1-9). 0 disables compression.
    pub gzip_compression: u32,

    /// Compute ETags and answer matching `If-None-Match` with 304.
    pub etag_enabled: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            gzip_compression: 0,
            etag_enabled: false,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared secret expected as `Authorization: Bearer <secret>`.
    pub secret: Option<String>,

    /// Value for `Access-Control-Allow-Origin`.
    pub allow_origin: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Download configuration for the built-in HTTP downloader.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// User-Agent sent to source servers.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("image-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_connection_cap_above_concurrency() {
        let config = GatewayConfig::default();
        assert!(config.listener.max_connections > config.processing.concurrency);
        assert_eq!(config.response.gzip_compression, 0);
        assert!(config.security.secret.is_none());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [processing]
            concurrency = 4

            [response]
            etag_enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.processing.concurrency, 4);
        assert!(config.response.etag_enabled);
        assert_eq!(config.response.ttl_secs, 3600);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
