//! Per-request deadline.
//!
//! A [`Deadline`] is started once per request, right after admission, and is
//! never extended. The pipeline checks it between stages and runs each
//! collaborator call under it, so a call that outlives the budget is dropped
//! and surfaces as a `Timeout` error.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{classify, BoxError, ImageError, ImageResult};

/// Fixed time budget for one request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    expires_at: Instant,
}

impl Deadline {
    /// Start a deadline that expires `budget` from now.
    pub fn start(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            expires_at: started + budget,
        }
    }

    /// Time since the deadline was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Fail with `Timeout` if the budget is used up.
    pub fn check(&self) -> ImageResult<()> {
        if self.is_expired() {
            Err(ImageError::timeout(self.elapsed()))
        } else {
            Ok(())
        }
    }

    /// Run a collaborator call under this deadline.
    ///
    /// The future is dropped at expiry. Collaborator errors are classified.
    pub async fn run<T, F>(&self, call: F) -> ImageResult<T>
    where
        F: Future<Output = Result<T, BoxError>>,
    {
        match tokio::time::timeout_at(self.expires_at, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify(err)),
            Err(_) => Err(ImageError::timeout(self.elapsed())),
        }
    }
}
