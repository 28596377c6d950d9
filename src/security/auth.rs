//! Shared-secret authentication.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use subtle::ConstantTimeEq;

use crate::error::{ImageError, ImageResult};

/// Checks `Authorization: Bearer <secret>` against the configured secret.
///
/// The expected header value is built once at construction and only read
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct SecretGate {
    expected: Option<Box<[u8]>>,
}

impl SecretGate {
    pub fn new(secret: Option<&str>) -> Self {
        let expected = secret
            .filter(|s| !s.is_empty())
            .map(|s| format!("Bearer {s}").into_bytes().into_boxed_slice());
        Self { expected }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Pass when no secret is configured or the header matches.
    pub fn check(&self, headers: &HeaderMap) -> ImageResult<()> {
        let Some(expected) = self.expected.as_deref() else {
            return Ok(());
        };

        let presented = headers
            .get(AUTHORIZATION)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if bool::from(presented.ct_eq(expected)) {
            Ok(())
        } else {
            Err(ImageError::invalid_secret())
        }
    }
}
