//! Open-connection bookkeeping.
//!
//! Every served connection holds a [`ConnectionSlot`] for its lifetime. The
//! slot carries a sequence number for log correlation and keeps the
//! `image_gateway_open_connections` gauge current as it opens and closes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Shared count of connections currently being served.
#[derive(Debug, Clone, Default)]
pub struct OpenConnections {
    count: Arc<AtomicU64>,
}

impl OpenConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection from `peer`.
    pub fn open(&self, peer: SocketAddr) -> ConnectionSlot {
        let now = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_open_connections(now);

        ConnectionSlot {
            count: Arc::clone(&self.count),
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            peer,
            opened: Instant::now(),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// One open connection. Closing is recorded on drop.
#[derive(Debug)]
pub struct ConnectionSlot {
    count: Arc<AtomicU64>,
    seq: u64,
    peer: SocketAddr,
    opened: Instant,
}

impl ConnectionSlot {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        let now = self.count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_open_connections(now);
        tracing::trace!(
            conn = self.seq,
            peer_addr = %self.peer,
            lifetime = ?self.opened.elapsed(),
            "Connection closed"
        );
    }
}
