//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection cap)
//!     → connection.rs (IDs, open-connection count)
//!     → Hand off to the HTTP layer, one task per connection
//! ```
//!
//! # Design Decisions
//! - The connection cap is larger than the admission capacity, so surplus
//!   requests queue at admission instead of being refused at the socket
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use listener::{Listener, ListenerError};
