//! Minimal collaborators used by the binary.
//!
//! These let the gateway serve traffic end to end without an image engine:
//! the parser understands only `/plain/<source-url>[@<ext>]`, the downloader
//! is a plain HTTP GET and the processor hands the source bytes back as-is.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::request::Parts;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use url::Url;

use crate::config::DownloadConfig;
use crate::error::{BoxError, ImageError};
use crate::processing::collaborators::{
    Collaborators, DownloadedImage, Downloader, ParsedRequest, PathParser, Processor,
};
use crate::processing::options::{ImageType, ProcessingOptions};
use crate::resilience::Deadline;

const PLAIN_PREFIX: &str = "/plain/";

/// Parses `/plain/<source-url>[@<ext>]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPathParser;

impl PathParser for PlainPathParser {
    fn parse(&self, request: &Parts) -> Result<ParsedRequest, BoxError> {
        let target = request
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_default();

        let raw = target
            .strip_prefix(PLAIN_PREFIX)
            .ok_or_else(|| ImageError::parse(format!("Invalid path: {target}")))?;

        let (source, explicit) = match raw.rsplit_once('@') {
            Some((source, ext)) => match ext.parse::<ImageType>() {
                Ok(format) => (source, Some(format)),
                Err(_) => (raw, None),
            },
            None => (raw, None),
        };

        let url = Url::parse(source)
            .map_err(|e| ImageError::parse(format!("Invalid source URL {source:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ImageError::parse(format!("Unsupported source scheme: {}", url.scheme())).into());
        }

        let format = explicit
            .or_else(|| source_extension(&url))
            .unwrap_or_default();

        Ok(ParsedRequest {
            options: ProcessingOptions {
                format,
                ..ProcessingOptions::default()
            },
            source_url: source.to_string(),
        })
    }
}

fn source_extension(url: &Url) -> Option<ImageType> {
    let name = url.path_segments()?.next_back()?;
    let (_, ext) = name.rsplit_once('.')?;
    ext.parse().ok()
}

/// Fetches source images over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download<'a>(
        &'a self,
        source_url: &'a str,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>> {
        async move {
            let response = self
                .client
                .get(source_url)
                .timeout(deadline.remaining())
                .send()
                .await
                .map_err(|e| fetch_error(e, deadline, format!("Can't download {source_url}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(
                    ImageError::download(format!("Can't download {source_url}: status {status}")).into(),
                );
            }

            let data = response
                .bytes()
                .await
                .map_err(|e| fetch_error(e, deadline, format!("Can't read {source_url}")))?;

            Ok::<_, BoxError>(DownloadedImage::new(data))
        }
        .boxed()
    }
}

/// The client timeout is set to the deadline, so an expiry can surface here
/// before the pipeline's own check sees it.
fn fetch_error(err: reqwest::Error, deadline: &Deadline, context: String) -> ImageError {
    if err.is_timeout() {
        ImageError::timeout(deadline.elapsed())
    } else {
        ImageError::download(format!("{context}: {err}"))
    }
}

/// Returns the source bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughProcessor;

impl Processor for PassthroughProcessor {
    fn process<'a>(
        &'a self,
        source: &'a [u8],
        _options: &'a ProcessingOptions,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>> {
        async move { Ok::<_, BoxError>(Bytes::copy_from_slice(source)) }.boxed()
    }
}

/// Wire the plain parser, HTTP downloader and passthrough processor.
pub fn collaborators(config: &DownloadConfig) -> Result<Collaborators, reqwest::Error> {
    Ok(Collaborators {
        parser: Arc::new(PlainPathParser),
        downloader: Arc::new(HttpDownloader::new(config)?),
        processor: Arc::new(PassthroughProcessor),
    })
}
