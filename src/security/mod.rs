//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (CORS headers on every response)
//!     → auth.rs (shared-secret check, constant time)
//!     → Pass to the pipeline
//! ```
//!
//! # Design Decisions
//! - Fail closed: a configured secret must match exactly
//! - The expected credential is computed once at startup
//! - CORS misconfiguration never fails a request

pub mod auth;
pub mod headers;

pub use auth::SecretGate;
pub use headers::Cors;
