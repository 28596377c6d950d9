//! Response encoding.
//!
//! # Responsibilities
//! - Content-Type and Content-Disposition from the output format
//! - Expires / Cache-Control from the configured TTL
//! - Optional gzip through the shared buffer pool
//! - Fixed responses for errors, OPTIONS, health checks and 304s
//!
//! Every header is placed on the response before it is handed to hyper.

use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::http::{
    header::{
        ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LENGTH,
        CONTENT_TYPE, ETAG, EXPIRES,
    },
    HeaderMap, HeaderValue, StatusCode,
};
use axum::response::Response;
use flate2::{write::GzEncoder, Compression};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::ResponseConfig;
use crate::error::{ImageError, ImageResult};
use crate::http::buffer::BufferPool;
use crate::processing::{ImageType, ProcessingOptions};

/// Filename used when the source URL has no usable last segment.
pub const FALLBACK_FILENAME: &str = "image";

/// Body of the health-check response.
pub const HEALTH_BODY: &str = "image-gateway is running";

const POOLED_BUFFERS: usize = 64;

/// `inline; filename="<name>.<ext>"` for a source URL.
pub fn content_disposition(source_url: &str, format: ImageType) -> String {
    let name = Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(|segment| {
                    let segment = percent_decode_str(segment).decode_utf8_lossy();
                    let stem = match segment.rfind('.') {
                        Some(dot) => &segment[..dot],
                        None => &segment[..],
                    };
                    quoted_string_escape(stem)
                })
        })
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    format!("inline; filename=\"{name}.{}\"", format.extension())
}

/// Escape `"` and `\` and drop control characters.
fn quoted_string_escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("gzip"))
}

fn gzip_into(data: &[u8], out: &mut Vec<u8>, level: u32) -> std::io::Result<()> {
    let mut encoder = GzEncoder::new(out, Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(())
}

/// Builds the final response of a request.
#[derive(Debug, Clone)]
pub struct ResponseEncoder {
    ttl: Duration,
    gzip_level: u32,
    pool: BufferPool,
}

impl ResponseEncoder {
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            gzip_level: config.gzip_compression,
            pool: BufferPool::new(POOLED_BUFFERS),
        }
    }

    pub fn gzip_enabled(&self) -> bool {
        self.gzip_level > 0
    }

    /// A 200 response carrying the processed image.
    pub fn image(
        &self,
        request_headers: &HeaderMap,
        options: &ProcessingOptions,
        source_url: &str,
        etag: Option<&str>,
        data: Bytes,
    ) -> ImageResult<Response> {
        let mut headers = HeaderMap::new();

        headers.insert(EXPIRES, expires_header(self.ttl)?);
        headers.insert(
            CACHE_CONTROL,
            header_value(format!("max-age={}, public", self.ttl.as_secs()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(options.format.mime()));
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_bytes(content_disposition(source_url, options.format).as_bytes())
                .map_err(|e| ImageError::unexpected(&e))?,
        );
        if let Some(etag) = etag {
            headers.insert(ETAG, header_value(etag)?);
        }

        let body = if self.gzip_enabled() && accepts_gzip(request_headers) {
            let mut buf = self.pool.get();
            gzip_into(&data, &mut buf, self.gzip_level).map_err(|e| ImageError::unexpected(&e))?;

            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            Bytes::copy_from_slice(&buf)
        } else {
            data
        };
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        let mut response = Response::new(Body::from(body));
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// A 304 carrying the validator.
    pub fn not_modified(&self, etag: &str) -> Response {
        let mut response = status_only(StatusCode::NOT_MODIFIED);
        if let Ok(value) = HeaderValue::from_str(etag) {
            response.headers_mut().insert(ETAG, value);
        }
        response
    }
}

/// 9999-12-31T23:59:59Z, the last instant an HTTP date can carry.
const LAST_HTTP_DATE_SECS: u64 = 253_402_300_799;

#[derive(Debug, thiserror::Error)]
#[error("cache lifetime of {0:?} runs past the last representable HTTP date")]
struct TtlOutOfRange(Duration);

fn expires_header(ttl: Duration) -> ImageResult<HeaderValue> {
    let last = UNIX_EPOCH + Duration::from_secs(LAST_HTTP_DATE_SECS);
    let expires = SystemTime::now()
        .checked_add(ttl)
        .filter(|at| *at <= last)
        .ok_or_else(|| ImageError::unexpected(&TtlOutOfRange(ttl)))?;
    header_value(httpdate::fmt_http_date(expires))
}

fn header_value(value: impl AsRef<str>) -> ImageResult<HeaderValue> {
    HeaderValue::from_str(value.as_ref()).map_err(|e| ImageError::unexpected(&e))
}

fn status_only(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn plain_text(status: StatusCode, body: &str) -> Response {
    let body = Bytes::copy_from_slice(body.as_bytes());
    let mut response = Response::new(Body::from(body.clone()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    response
}

/// Status code and public message only.
pub fn error(err: &ImageError) -> Response {
    plain_text(err.status(), err.public_message())
}

/// Empty 200 for OPTIONS requests.
pub fn options() -> Response {
    status_only(StatusCode::OK)
}

/// Fixed health-check answer.
pub fn health() -> Response {
    plain_text(StatusCode::OK, HEALTH_BODY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Read;

    use flate2::read::GzDecoder;

    fn encoder(gzip: u32) -> ResponseEncoder {
        ResponseEncoder::new(&ResponseConfig {
            ttl_secs: 120,
            gzip_compression: gzip,
            etag_enabled: false,
        })
    }

    fn png_options() -> ProcessingOptions {
        ProcessingOptions {
            format: ImageType::Png,
            ..ProcessingOptions::default()
        }
    }

    fn gzip_accepting() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("deflate, gzip;q=1.0"));
        headers
    }

    async fn body_bytes(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[test]
    fn disposition_uses_last_segment_without_extension() {
        assert_eq!(
            content_disposition("http://x/y/photo.png?a=b", ImageType::Png),
            "inline; filename=\"photo.png\""
        );
        assert_eq!(
            content_disposition("http://x/y/photo.jpeg", ImageType::Webp),
            "inline; filename=\"photo.webp\""
        );
        assert_eq!(
            content_disposition("https://cdn/archive.tar.gz", ImageType::Gif),
            "inline; filename=\"archive.tar.gif\""
        );
    }

    #[test]
    fn disposition_decodes_and_escapes_the_name() {
        assert_eq!(
            content_disposition("http://x/my%20photo.png", ImageType::Png),
            "inline; filename=\"my photo.png\""
        );
        assert_eq!(
            content_disposition("http://x/a%22b%5Cc.png", ImageType::Png),
            "inline; filename=\"a\\\"b\\\\c.png\""
        );
        assert_eq!(
            content_disposition("http://x/bad%0Aname.png", ImageType::Png),
            "inline; filename=\"badname.png\""
        );
    }

    #[test]
    fn non_ascii_name_survives_into_the_header() {
        let response = encoder(0)
            .image(
                &HeaderMap::new(),
                &png_options(),
                "http://x/caf%C3%A9.png",
                None,
                Bytes::from_static(b"png"),
            )
            .unwrap();
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION].as_bytes(),
            "inline; filename=\"café.png\"".as_bytes()
        );
    }

    #[test]
    fn disposition_falls_back() {
        for url in ["http://x", "http://x/", "http://x/y/", "::not a url::"] {
            assert_eq!(
                content_disposition(url, ImageType::Jpeg),
                "inline; filename=\"image.jpg\"",
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn cache_and_content_headers() {
        let response = encoder(0)
            .image(
                &HeaderMap::new(),
                &png_options(),
                "http://x/y/photo.png",
                Some("\"tag\""),
                Bytes::from_static(b"png-bytes"),
            )
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CACHE_CONTROL], "max-age=120, public");
        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[CONTENT_DISPOSITION], "inline; filename=\"photo.png\"");
        assert_eq!(headers[ETAG], "\"tag\"");
        assert_eq!(headers[CONTENT_LENGTH], "9");
        assert!(headers.get(CONTENT_ENCODING).is_none());

        let expires = httpdate::parse_http_date(headers[EXPIRES].to_str().unwrap()).unwrap();
        let expected = SystemTime::now() + Duration::from_secs(120);
        let skew = expected
            .duration_since(expires)
            .unwrap_or_else(|e| e.duration());
        assert!(skew <= Duration::from_secs(1), "skew {skew:?}");

        assert_eq!(body_bytes(response).await.as_ref(), b"png-bytes");
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        for ttl_secs in [300_000_000_000, u64::MAX] {
            let encoder = ResponseEncoder::new(&ResponseConfig {
                ttl_secs,
                gzip_compression: 0,
                etag_enabled: false,
            });
            let err = encoder
                .image(
                    &HeaderMap::new(),
                    &png_options(),
                    "http://x/a.png",
                    None,
                    Bytes::from_static(b"png"),
                )
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unexpected, "{ttl_secs}");
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn gzip_round_trip() {
        let data = Bytes::from(vec![7u8; 4096]);
        let encoder = encoder(6);
        let response = encoder
            .image(&gzip_accepting(), &png_options(), "http://x/a.png", None, data.clone())
            .unwrap();

        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
        let length: usize = response.headers()[CONTENT_LENGTH].to_str().unwrap().parse().unwrap();

        let body = body_bytes(response).await;
        assert_eq!(body.len(), length);
        assert!(body.len() < data.len());

        let mut decoded = Vec::new();
        GzDecoder::new(body.as_ref()).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, data.as_ref());

        assert_eq!(encoder.pool.idle(), 1);
    }

    #[tokio::test]
    async fn no_gzip_when_disabled_or_not_accepted() {
        let data = Bytes::from_static(b"raw");

        let response = encoder(0)
            .image(&gzip_accepting(), &png_options(), "http://x/a.png", None, data.clone())
            .unwrap();
        assert!(response.headers().get(CONTENT_ENCODING).is_none());

        let response = encoder(6)
            .image(&HeaderMap::new(), &png_options(), "http://x/a.png", None, data)
            .unwrap();
        assert!(response.headers().get(CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(response).await.as_ref(), b"raw");
    }

    #[tokio::test]
    async fn fixed_responses() {
        let err = error(&ImageError::invalid_method());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_bytes(err).await.as_ref(), b"Method doesn't allowed");

        let not_modified = encoder(0).not_modified("\"tag\"");
        assert_eq!(not_modified.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(not_modified.headers()[ETAG], "\"tag\"");
        assert!(body_bytes(not_modified).await.is_empty());

        assert_eq!(body_bytes(health()).await.as_ref(), HEALTH_BODY.as_bytes());
        assert!(body_bytes(options()).await.is_empty());
    }
}
