//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_gateway_requests_total` (counter): requests that reached admission
//! - `image_gateway_request_duration_seconds` (histogram): time from
//!   admission wait to response
//! - `image_gateway_errors_total` (counter): failures by `type`
//!   (`download`, `processing`)
//! - `image_gateway_open_connections` (gauge): accepted connections
//! - `image_gateway_admission_in_use` (gauge): held admission slots
//!
//! Without an installed recorder every call is a no-op, so recording can
//! never fail a request.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Download,
    Processing,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Processing => "processing",
        }
    }
}

pub fn record_error(source: ErrorSource) {
    counter!("image_gateway_errors_total", "type" => source.as_str()).increment(1);
}

pub fn set_open_connections(count: u64) {
    gauge!("image_gateway_open_connections").set(count as f64);
}

pub fn set_admission_in_use(count: usize) {
    gauge!("image_gateway_admission_in_use").set(count as f64);
}

/// Counts a request and records its duration when dropped.
#[derive(Debug)]
pub struct RequestTimer {
    started: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        counter!("image_gateway_requests_total").increment(1);
        Self {
            started: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        histogram!("image_gateway_request_duration_seconds")
            .record(self.started.elapsed().as_secs_f64());
    }
}
