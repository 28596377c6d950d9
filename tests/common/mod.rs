//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use image_gateway::config::GatewayConfig;
use image_gateway::error::{BoxError, ImageError};
use image_gateway::net::Listener;
use image_gateway::processing::plain::PlainPathParser;
use image_gateway::processing::{
    Collaborators, DownloadedImage, Downloader, ProcessingOptions, Processor,
};
use image_gateway::resilience::Deadline;
use image_gateway::{HttpServer, Shutdown};

pub const SOURCE_BYTES: &[u8] = b"\x89PNG fake image payload for the gateway tests";

/// Path that the plain parser maps to a PNG source.
pub const IMAGE_PATH: &str = "/plain/http://origin.test/images/cat.png";

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config with small limits and an ephemeral bind address.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.listener.max_connections = 64;
    config.processing.concurrency = 4;
    config.timeouts.read_secs = 5;
    config.timeouts.write_secs = 5;
    config
}

pub async fn spawn_gateway(config: GatewayConfig, collaborators: Collaborators) -> TestGateway {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, collaborators);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.signal()));

    TestGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn collaborators(
    downloader: impl Downloader + 'static,
    processor: impl Processor + 'static,
) -> Collaborators {
    Collaborators {
        parser: Arc::new(PlainPathParser),
        downloader: Arc::new(downloader),
        processor: Arc::new(processor),
    }
}

/// Serves [`SOURCE_BYTES`] after an optional delay.
#[derive(Debug, Clone, Default)]
pub struct StaticDownloader {
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

impl StaticDownloader {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl Downloader for StaticDownloader {
    fn download<'a>(
        &'a self,
        _source_url: &'a str,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let released = self.released.clone();
            Ok::<_, BoxError>(DownloadedImage::new(SOURCE_BYTES).with_release(move || {
                released.fetch_add(1, Ordering::SeqCst);
            }))
        }
        .boxed()
    }
}

/// Tracks how many downloads run at once.
#[derive(Debug, Clone, Default)]
pub struct GaugeDownloader {
    pub delay: Duration,
    pub current: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl Downloader for GaugeDownloader {
    fn download<'a>(
        &'a self,
        _source_url: &'a str,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>> {
        async move {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, BoxError>(DownloadedImage::new(SOURCE_BYTES))
        }
        .boxed()
    }
}

/// Never completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingDownloader;

impl Downloader for PendingDownloader {
    fn download<'a>(
        &'a self,
        _source_url: &'a str,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>> {
        futures_util::future::pending::<Result<DownloadedImage, BoxError>>().boxed()
    }
}

/// Fails with whatever error the factory builds.
pub struct FailingDownloader {
    pub error: fn() -> BoxError,
}

impl Downloader for FailingDownloader {
    fn download<'a>(
        &'a self,
        _source_url: &'a str,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<DownloadedImage, BoxError>> {
        let error = (self.error)();
        async move { Err::<DownloadedImage, BoxError>(error) }.boxed()
    }
}

pub fn unreachable_source() -> BoxError {
    ImageError::download("Can't download http://origin.test/images/cat.png: status 404").into()
}

pub fn unknown_failure() -> BoxError {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "origin hung up").into()
}

/// Returns the source unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProcessor;

impl Processor for EchoProcessor {
    fn process<'a>(
        &'a self,
        source: &'a [u8],
        _options: &'a ProcessingOptions,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>> {
        async move { Ok::<_, BoxError>(Bytes::copy_from_slice(source)) }.boxed()
    }
}

/// Never completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingProcessor;

impl Processor for PendingProcessor {
    fn process<'a>(
        &'a self,
        _source: &'a [u8],
        _options: &'a ProcessingOptions,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>> {
        futures_util::future::pending::<Result<Bytes, BoxError>>().boxed()
    }
}

/// Fails with whatever error the factory builds.
pub struct FailingProcessor {
    pub error: fn() -> BoxError,
}

impl Processor for FailingProcessor {
    fn process<'a>(
        &'a self,
        _source: &'a [u8],
        _options: &'a ProcessingOptions,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>> {
        let error = (self.error)();
        async move { Err::<Bytes, BoxError>(error) }.boxed()
    }
}

pub fn corrupt_source() -> BoxError {
    ImageError::processing("Can't decode source: truncated PNG").into()
}

/// An origin that accepts connections and never answers.
pub async fn stalled_origin() -> SocketAddr {
    let origin = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = origin.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = origin.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Counts calls and echoes the source.
#[derive(Debug, Clone, Default)]
pub struct CountingProcessor {
    pub calls: Arc<AtomicUsize>,
}

impl Processor for CountingProcessor {
    fn process<'a>(
        &'a self,
        source: &'a [u8],
        _options: &'a ProcessingOptions,
        _deadline: &'a Deadline,
    ) -> BoxFuture<'a, Result<Bytes, BoxError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(Bytes::copy_from_slice(source))
        }
        .boxed()
    }
}
