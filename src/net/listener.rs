//! TCP listener with a hard cap on accepted connections.
//!
//! The cap bounds sockets and file descriptors; CPU and memory heavy work is
//! bounded separately by the admission controller. Once the cap is reached,
//! further clients wait in the kernel backlog until a connection closes.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("can't listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

/// Accepts at most `max_connections` sockets at a time.
pub struct Listener {
    socket: TcpListener,
    open_slots: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let socket = TcpListener::bind(addr).await.map_err(bind_error)?;

        tracing::info!(
            address = %socket.local_addr().map_err(bind_error)?,
            max_connections = config.max_connections,
            "Listening"
        );

        Ok(Self {
            socket,
            open_slots: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Wait for a free slot, then for a client.
    ///
    /// The returned permit must live as long as the connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        let permit = Arc::clone(&self.open_slots)
            .acquire_owned()
            .await
            .expect("connection semaphore closed");

        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;
        tracing::trace!(
            peer_addr = %peer,
            free_slots = self.open_slots.available_permits(),
            "Accepted"
        );

        Ok((stream, peer, ConnectionPermit { _slot: permit }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// Holds one connection slot; dropping it frees the slot even if the
/// connection task panicked.
#[derive(Debug)]
pub struct ConnectionPermit {
    _slot: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn local(max_connections: usize) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections,
        }
    }

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let config = ListenerConfig {
            bind_address: "not-an-address".into(),
            max_connections: 1,
        };
        let err = Listener::bind(&config).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert!(err.to_string().contains("not-an-address"));
    }

    #[tokio::test]
    async fn accept_holds_a_slot_until_the_permit_drops() {
        let listener = Listener::bind(&local(1)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _first = TcpStream::connect(addr).await.unwrap();
        let (_stream, _, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.open_slots.available_permits(), 0);

        let _second = TcpStream::connect(addr).await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err(), "second connection must wait for a slot");

        drop(permit);
        let accepted = tokio::time::timeout(Duration::from_secs(1), listener.accept()).await;
        assert!(accepted.unwrap().is_ok());
    }
}
