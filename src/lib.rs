//! Image Gateway
//!
//! The request-serving core of an image transformation service, built with
//! Tokio, hyper and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ http::server ──▶ http::handler ──────────────┐
//!              (connection cap)   (task per        method / CORS / auth /     │
//!                                  connection)     health shortcut            │
//!                                                        │                    │
//!                                                        ▼                    │
//!                                        resilience::admission (slots)        │
//!                                        resilience::timeouts (deadline)      │
//!                                                        │                    │
//!                                                        ▼                    │
//!                                  processing: PathParser → Downloader        │
//!                                              → etag → Processor             │
//!                                                        │                    │
//!   Client ◀──────────────────────── http::response ◀────┴──── error ◀────────┘
//!                                     (cache headers, gzip)    (classifier)
//! ```
//!
//! Cross-cutting: `config`, `lifecycle`, `observability`, `security`.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod processing;
pub mod resilience;
pub mod security;

pub use config::GatewayConfig;
pub use error::{ErrorKind, ImageError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
