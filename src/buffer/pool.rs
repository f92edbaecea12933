//! Size-keyed pool of reusable byte buffers.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use tracing::trace;

/// Maximum number of free buffers kept per capacity.
pub const DEFAULT_MAX_PER_SIZE: usize = 4;

/// A free buffer is reused only if its capacity is at most this many times
/// the request.
const MAX_SLACK: usize = 2;

/// A cache of released buffers, keyed by capacity.
///
/// `acquire` hands out the smallest free buffer whose capacity fits the
/// request without exceeding it by more than a factor of two, trimmed to
/// exactly the requested length. `acquire_exact` only reuses a buffer of
/// the exact capacity. The pool has no
/// internal locking; share it across readers only behind external
/// synchronization.
///
/// # Example
///
/// ```
/// use stripeio::BufferPool;
///
/// let mut pool = BufferPool::new();
/// let buf = pool.acquire(4096);
/// assert_eq!(buf.len(), 4096);
///
/// pool.release(buf);
/// assert_eq!(pool.free_buffers(), 1);
///
/// let again = pool.acquire(3000);
/// assert_eq!(again.len(), 3000);
/// assert!(again.capacity() >= 4096);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    free: BTreeMap<usize, Vec<BytesMut>>,
    max_per_size: usize,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::with_max_per_size(DEFAULT_MAX_PER_SIZE)
    }

    /// Creates an empty pool that keeps at most `max` free buffers per capacity.
    pub fn with_max_per_size(max: usize) -> Self {
        Self {
            free: BTreeMap::new(),
            max_per_size: max,
        }
    }

    /// Returns a zeroed buffer of exactly `size` bytes.
    pub fn acquire(&mut self, size: usize) -> BytesMut {
        self.take(size, size.saturating_mul(MAX_SLACK))
    }

    /// Returns a zeroed buffer of exactly `size` bytes whose capacity is
    /// also `size` when it comes from the pool.
    ///
    /// Used where the whole allocation stays pinned by the data handed out.
    pub fn acquire_exact(&mut self, size: usize) -> BytesMut {
        self.take(size, size)
    }

    fn take(&mut self, size: usize, max_capacity: usize) -> BytesMut {
        let reused = self
            .free
            .range_mut(size..=max_capacity)
            .find_map(|(_, bucket)| bucket.pop());
        self.free.retain(|_, bucket| !bucket.is_empty());

        let mut buf = match reused {
            Some(buf) => {
                trace!(size, capacity = buf.capacity(), "buffer pool hit");
                buf
            }
            None => {
                trace!(size, "buffer pool miss");
                BytesMut::with_capacity(size)
            }
        };
        buf.clear();
        buf.resize(size, 0);
        buf
    }

    /// Returns a buffer to the pool for reuse.
    pub fn release(&mut self, mut buf: BytesMut) {
        let capacity = buf.capacity();
        if capacity == 0 {
            return;
        }
        buf.clear();
        let bucket = self.free.entry(capacity).or_default();
        if bucket.len() < self.max_per_size {
            bucket.push(buf);
        }
    }

    /// Returns a frozen buffer to the pool if nothing else references it.
    ///
    /// Returns false (and drops `buf`) when other views are still alive.
    pub fn reclaim(&mut self, buf: Bytes) -> bool {
        match buf.try_into_mut() {
            Ok(buf) => {
                self.release(buf);
                true
            }
            Err(_) => false,
        }
    }

    /// Returns the number of free buffers.
    pub fn free_buffers(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Returns the total capacity held by free buffers.
    pub fn free_bytes(&self) -> usize {
        self.free
            .iter()
            .map(|(capacity, bucket)| capacity * bucket.len())
            .sum()
    }

    /// Drops every free buffer.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
