//! Processing admission control.
//!
//! A fixed pool of slots bounding how many requests may download and process
//! images at the same time. Requests beyond capacity wait in `acquire()`
//! until a slot is released; nothing is rejected here.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Fixed-capacity slot pool.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionController {
    /// Create a pool with `capacity` slots. The capacity never changes.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    ///
    /// The slot is released when the returned permit is dropped, on every
    /// exit path of the holder.
    pub async fn acquire(&self) -> AdmissionPermit {
        // The semaphore is owned by this controller and never closed.
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("admission semaphore closed");
        metrics::set_admission_in_use(self.in_use());

        AdmissionPermit {
            _permit: permit,
            controller: self.clone(),
        }
    }

    /// Configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}

/// A held admission slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    controller: AdmissionController,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // Runs before the inner permit is returned.
        metrics::set_admission_in_use(self.controller.in_use().saturating_sub(1));
    }
}
