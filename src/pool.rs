//! Reusable scratch buffers for the emit path.
//!
//! Emitting allocates one byte buffer per call; under concurrent load those
//! allocations add up, so filled buffers are recycled through a shared
//! free-list instead of being dropped. Pooling is purely an optimization:
//! an always-allocate pool is behaviorally equivalent.

use lazy_static::lazy_static;
use parking_lot::Mutex;

/// Initial capacity of pooled log-line buffers.
const LEN_LOG: usize = 1024;

/// Retention cap; releases beyond this are dropped instead of stored.
const MAX_RETAINED: usize = 64;

/// A thread-safe free-list of `Vec<T>` scratch space.
///
/// `acquire` hands out a cleared vector (recycled when available, freshly
/// allocated otherwise); `release` returns one for reuse. A released vector
/// must not be read afterward.
pub struct ArrayPool<T> {
    entries: Mutex<Vec<Vec<T>>>,
    capacity: usize,
}

impl<T> ArrayPool<T> {
    /// Creates a pool whose fresh vectors start with `capacity` elements of
    /// reserved space.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Takes an empty vector from the pool, allocating if none is available.
    pub fn acquire(&self) -> Vec<T> {
        self.entries
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.capacity))
    }

    /// Returns a vector to the pool. Contents are cleared; reserved space is
    /// kept intact for reuse.
    pub fn release(&self, mut entry: Vec<T>) {
        entry.clear();
        let mut entries = self.entries.lock();
        if entries.len() < MAX_RETAINED {
            entries.push(entry);
        }
    }
}

lazy_static! {
    /// Shared pool of log-line buffers, used by every emitter in the
    /// process. Safe for concurrent acquire/release.
    pub(crate) static ref LOG_BUFFER_POOL: ArrayPool<u8> = ArrayPool::new(LEN_LOG);
}
