//! Reusable byte buffers for response compression.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

/// Buffers larger than this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 8 * 1024 * 1024;

/// A shared pool of byte buffers.
///
/// Buffers are cleared when borrowed and handed back when the
/// [`PooledBuffer`] guard drops, on success and error paths alike.
#[derive(Debug, Clone)]
pub struct BufferPool {
    buffers: Arc<Mutex<Vec<Vec<u8>>>>,
    max_pooled: usize,
}

impl BufferPool {
    pub fn new(max_pooled: usize) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(Vec::with_capacity(max_pooled))),
            max_pooled,
        }
    }

    /// Borrow an empty buffer.
    pub fn get(&self) -> PooledBuffer<'_> {
        let mut buf = self
            .buffers
            .lock()
            .expect("buffer pool mutex poisoned")
            .pop()
            .unwrap_or_default();
        buf.clear();

        PooledBuffer { buf, pool: self }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.buffers.lock().expect("buffer pool mutex poisoned").len()
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();

        let mut buffers = self.buffers.lock().expect("buffer pool mutex poisoned");
        if buffers.len() < self.max_pooled {
            buffers.push(buf);
        }
    }
}

/// A buffer borrowed from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
