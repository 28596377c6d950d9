//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection task, Axum router)
//!     → handler.rs (pipeline: method, auth, health, admission, deadline,
//!                   parse, download, ETag, process)
//!     → response.rs (headers, gzip via buffer.rs)
//!     → Send to client
//! ```

pub mod buffer;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use request::RequestId;
pub use server::{AppState, HttpServer};
