//! Shutdown trigger shared by `main` and the serve loop.
//!
//! The state is a latch: once triggered it stays triggered, so a signal
//! obtained after the trigger still fires.

use tokio::sync::watch;

/// Owner side of the latch.
#[derive(Debug, Clone)]
pub struct Shutdown {
    latch: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            latch: watch::Sender::new(false),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            latch: self.latch.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.latch.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Waiting side of the latch.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    latch: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered. Dropping every [`Shutdown`]
    /// handle counts as a trigger.
    pub async fn triggered(&mut self) {
        let _ = self.latch.wait_for(|&down| down).await;
    }
}
