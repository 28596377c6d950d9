//! Contracts for the external stages of the pipeline.
//!
//! The gateway core drives these but does not implement them: URL grammar,
//! image fetching and pixel processing live behind these traits.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::request::Parts;
use futures_util::future::BoxFuture;

use crate::error::BoxError;
use crate::processing::options::ProcessingOptions;
use crate::resilience::Deadline;

/// Output of the path parser.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub options: ProcessingOptions,
    pub source_url: String,
}

/// Turns a request into processing options and a source URL.
pub trait PathParser: Send + Sync {
    fn parse(&self, request: &Parts) -> Result<ParsedRequest, BoxError>;
}

/// Fetches source image bytes.
///
/// Implementations should watch `deadline` during long transfers; the
/// pipeline also drops the returned future once the deadline passes.
pub trait Downloader: Send + Sync {
    fn download<'a>(
        &'a self,
        source_url: &'a str,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>>;
}

/// Transforms source bytes according to the processing options.
pub trait Processor: Send + Sync {
    fn process<'a>(
        &'a self,
        source: &'a [u8],
        options: &'a ProcessingOptions,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>>;
}

type Release = Box<dyn FnOnce() + Send>;

/// Downloaded source bytes plus an optional release hook.
///
/// The hook runs exactly once, when the image is dropped.
pub struct DownloadedImage {
    data: Bytes,
    release: Option<Release>,
}

impl DownloadedImage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            release: None,
        }
    }

    /// Attach a hook that frees whatever resource backs `data`.
    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl fmt::Debug for DownloadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadedImage")
            .field("len", &self.data.len())
            .field("release", &self.release.is_some())
            .finish()
    }
}

impl Drop for DownloadedImage {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// The external stages used by the request pipeline.
#[derive(Clone)]
pub struct Collaborators {
    pub parser: Arc<dyn PathParser>,
    pub downloader: Arc<dyn Downloader>,
    pub processor: Arc<dyn Processor>,
}
