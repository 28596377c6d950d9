//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request past auth:
//!     → admission.rs (wait for one of `concurrency` slots)
//!     → timeouts.rs (start the request deadline)
//!     → parse / download / process, each checked against the deadline
//!     → slot released when the request finishes, however it finishes
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline; none is ever extended
//! - Admission queues instead of rejecting; the listener's connection cap
//!   bounds the queue
//! - Timeout errors are distinct from other errors

pub mod admission;
pub mod timeouts;

pub use admission::{AdmissionController, AdmissionPermit};
pub use timeouts::Deadline;
