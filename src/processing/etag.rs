//! Strong ETag validators.

use axum::http::{header::IF_NONE_MATCH, HeaderMap};
use sha2::{Digest, Sha256};

use crate::error::{ImageError, ImageResult};
use crate::processing::options::ProcessingOptions;

/// Quoted SHA-256 over the serialized options followed by the source bytes.
pub fn calculate(source: &[u8], options: &ProcessingOptions) -> ImageResult<String> {
    let encoded_options = serde_json::to_vec(options).map_err(|e| ImageError::unexpected(&e))?;

    let mut hasher = Sha256::new();
    hasher.update(&encoded_options);
    hasher.update(source);

    Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Whether the request's `If-None-Match` covers `etag`.
pub fn matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
}
