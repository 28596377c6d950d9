//! CORS response headers.

use axum::http::{
    header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
    HeaderMap, HeaderValue,
};

const ALLOWED_METHODS: HeaderValue = HeaderValue::from_static("GET, OPTIONS");

/// CORS headers attached to every response when an origin is configured.
#[derive(Debug, Clone, Default)]
pub struct Cors {
    allow_origin: Option<HeaderValue>,
}

impl Cors {
    /// An origin that is not a valid header value disables CORS with a warning.
    pub fn new(allow_origin: Option<&str>) -> Self {
        let allow_origin = allow_origin.filter(|o| !o.is_empty()).and_then(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| {
                    tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                })
                .ok()
        });
        Self { allow_origin }
    }

    pub fn is_enabled(&self) -> bool {
        self.allow_origin.is_some()
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(origin) = &self.allow_origin {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS);
        }
    }
}
