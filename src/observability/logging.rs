//! Structured logging.
//!
//! `RUST_LOG` takes precedence over the configured level. Response lines are
//! logged at a level chosen by status band so the fmt layer colours them:
//! 5xx red, 4xx yellow, everything else green.

use axum::http::StatusCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ImageError;

/// Install the global tracing subscriber.
pub fn init(log_level: &str) {
    let default_filter = format!("image_gateway={log_level},tower_http=warn");

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Severity band for a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Severe,
    Warning,
    Normal,
}

impl Band {
    pub fn of(status: StatusCode) -> Self {
        match status.as_u16() {
            500.. => Band::Severe,
            400..=499 => Band::Warning,
            _ => Band::Normal,
        }
    }
}

/// Log a finished response.
pub fn log_response(request_id: &str, status: StatusCode, message: &str) {
    let code = status.as_u16();
    match Band::of(status) {
        Band::Severe => tracing::error!(request_id, status = code, "{message}"),
        Band::Warning => tracing::warn!(request_id, status = code, "{message}"),
        Band::Normal => tracing::info!(request_id, status = code, "{message}"),
    }
}

/// Log a failed request with its error kind and internal message.
pub fn log_error(request_id: &str, err: &ImageError) {
    let code = err.status().as_u16();
    let kind = err.kind().as_str();
    let message = err.message();
    match Band::of(err.status()) {
        Band::Severe => tracing::error!(request_id, status = code, kind, "{message}"),
        Band::Warning => tracing::warn!(request_id, status = code, kind, "{message}"),
        Band::Normal => tracing::info!(request_id, status = code, kind, "{message}"),
    }
}
