//! Size-bucketed cache of reusable byte buffers.
//!
//! The pool keeps a list of `(size, slot)` buckets sorted ascending by
//! size. The buffers themselves live in a generation-checked slot table;
//! a bucket is only a non-owning reference into it. When the retention
//! budget is exceeded, or [`BufferPool::reclaim`] is called, cached
//! buffers are freed through the slot table and their buckets go dead.
//! Dead buckets are removed lazily the next time a lookup walks over
//! them.
//!
//! ```text
//! request(n):  n < min_size_to_pool ──────────────► fresh allocation (no lock)
//!              lock → first bucket with size >= n
//!                     ├─ live  → remove bucket, hand buffer out
//!                     └─ dead  → remove bucket, try the next one
//!              list exhausted → unlock → fresh allocation
//!
//! release(b):  len < min_size_to_pool ────────────► dropped
//!              lock → insert before first bucket with size > len
//!                   → evict oldest while over budget
//! ```
//!
//! The lock is held only while the bucket list is scanned or edited.
//! Allocation, zeroing, and freeing happen outside it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use spectra_core::{Resource, SpectraError};
use tracing::trace;

use crate::config::{ConfigError, PoolConfig};
use crate::slots::{SlotRef, SlotTable};
use crate::storage::RawStorage;

struct Bucket {
    size: usize,
    slot: SlotRef,
}

struct PoolState {
    /// Sorted ascending by `size`. Entries may be dead.
    buckets: Vec<Bucket>,
    cache: SlotTable<Box<[u8]>>,
    /// Insertion order of cached buffers, for budget eviction. May hold
    /// dead references.
    age: VecDeque<SlotRef>,
    retained_bytes: usize,
}

impl PoolState {
    fn compact(&mut self) {
        let live = self.cache.live();
        let limit = live * 2 + 16;
        if self.buckets.len() > limit {
            let cache = &self.cache;
            self.buckets.retain(|b| cache.is_live(b.slot));
        }
        if self.age.len() > limit {
            let cache = &self.cache;
            self.age.retain(|&s| cache.is_live(s));
        }
    }
}

#[derive(Default)]
struct Counters {
    fresh_allocations: AtomicU64,
    hits: AtomicU64,
    dead_discards: AtomicU64,
    discarded_small: AtomicU64,
    evictions: AtomicU64,
}

struct PoolInner {
    min_size_to_pool: AtomicUsize,
    max_retained_bytes: usize,
    state: Mutex<PoolState>,
    counters: Counters,
}

impl PoolInner {
    fn min_size(&self) -> usize {
        self.min_size_to_pool.load(Ordering::Relaxed)
    }

    fn allocate_fresh(&self, len: usize) -> Box<[u8]> {
        self.counters.fresh_allocations.fetch_add(1, Ordering::Relaxed);
        vec![0u8; len].into_boxed_slice()
    }

    fn take_cached(&self, min_size: usize) -> Option<Box<[u8]>> {
        let mut state = self.state.lock();
        let start = state.buckets.partition_point(|b| b.size < min_size);
        while start < state.buckets.len() {
            let bucket = state.buckets.remove(start);
            match state.cache.take(bucket.slot) {
                Some(buffer) => {
                    state.retained_bytes -= buffer.len();
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(requested = min_size, size = bucket.size, "pool hit");
                    return Some(buffer);
                }
                None => {
                    self.counters.dead_discards.fetch_add(1, Ordering::Relaxed);
                    trace!(size = bucket.size, "discarded dead bucket");
                }
            }
        }
        trace!(requested = min_size, "pool miss");
        None
    }

    fn give_back(&self, buffer: Box<[u8]>) {
        let size = buffer.len();
        if size < self.min_size() {
            self.counters.discarded_small.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if size > self.max_retained_bytes {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let victims = {
            let mut state = self.state.lock();
            let at = state.buckets.partition_point(|b| b.size <= size);
            let slot = state.cache.insert(buffer);
            state.buckets.insert(at, Bucket { size, slot });
            state.age.push_back(slot);
            state.retained_bytes += size;
            trace!(size, position = at, "buffer returned to pool");

            let mut victims = Vec::new();
            while state.retained_bytes > self.max_retained_bytes {
                let Some(oldest) = state.age.pop_front() else {
                    break;
                };
                if let Some(victim) = state.cache.take(oldest) {
                    state.retained_bytes -= victim.len();
                    victims.push(victim);
                }
            }
            state.compact();
            victims
        };
        if !victims.is_empty() {
            self.counters
                .evictions
                .fetch_add(victims.len() as u64, Ordering::Relaxed);
            trace!(count = victims.len(), "evicted cached buffers over budget");
        }
    }
}

/// A thread-safe, size-bucketed cache of large byte buffers.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Create a pool with the default configuration.
    pub fn new() -> Self {
        Self::from_valid(PoolConfig::default())
    }

    /// Create a pool from a validated configuration.
    pub fn with_config(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                min_size_to_pool: AtomicUsize::new(config.min_size_to_pool),
                max_retained_bytes: config.max_retained_bytes,
                state: Mutex::new(PoolState {
                    buckets: Vec::new(),
                    cache: SlotTable::new(),
                    age: VecDeque::new(),
                    retained_bytes: 0,
                }),
                counters: Counters::default(),
            }),
        }
    }

    /// Check out a buffer of at least `min_size` bytes.
    ///
    /// Requests below the pooling threshold are always freshly allocated
    /// and never take the lock. A reused buffer may be longer than
    /// requested and its contents are unspecified; a fresh one is zeroed.
    pub fn request(&self, min_size: usize) -> PooledBuffer {
        let buffer = if min_size < self.inner.min_size() {
            None
        } else {
            self.inner.take_cached(min_size)
        };
        let buffer = buffer.unwrap_or_else(|| self.inner.allocate_fresh(min_size));
        PooledBuffer {
            buffer: Some(buffer),
            pool: Arc::downgrade(&self.inner),
        }
    }

    /// Current pooling threshold in bytes.
    pub fn min_size_to_pool(&self) -> usize {
        self.inner.min_size()
    }

    /// Change the pooling threshold.
    ///
    /// Buffers already cached stay cached; the threshold applies to
    /// future requests and returns.
    pub fn set_min_size_to_pool(&self, bytes: usize) {
        self.inner.min_size_to_pool.store(bytes, Ordering::Relaxed);
    }

    /// Free every cached buffer.
    ///
    /// Bucket entries are left in place and go dead; they are discarded
    /// by later lookups. Returns the number of buffers freed.
    pub fn reclaim(&self) -> usize {
        let victims = {
            let mut state = self.inner.state.lock();
            state.retained_bytes = 0;
            state.age.clear();
            state.cache.drain()
        };
        let count = victims.len();
        self.inner
            .counters
            .evictions
            .fetch_add(count as u64, Ordering::Relaxed);
        trace!(count, "reclaimed cached buffers");
        count
    }

    /// Snapshot of the pool's counters and cache occupancy.
    pub fn stats(&self) -> PoolStats {
        let (cached, bucket_entries, retained_bytes) = {
            let state = self.inner.state.lock();
            (
                state.cache.live(),
                state.buckets.len(),
                state.retained_bytes,
            )
        };
        let c = &self.inner.counters;
        PoolStats {
            fresh_allocations: c.fresh_allocations.load(Ordering::Relaxed),
            hits: c.hits.load(Ordering::Relaxed),
            dead_discards: c.dead_discards.load(Ordering::Relaxed),
            discarded_small: c.discarded_small.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
            cached,
            bucket_entries,
            retained_bytes,
        }
    }

    /// Bucket sizes in list order, dead entries included.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.inner
            .state
            .lock()
            .buckets
            .iter()
            .map(|b| b.size)
            .collect()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("min_size_to_pool", &self.min_size_to_pool())
            .field("max_retained_bytes", &self.inner.max_retained_bytes)
            .finish_non_exhaustive()
    }
}

/// Counters reported by [`BufferPool::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Requests served by a new allocation.
    pub fresh_allocations: u64,
    /// Requests served from the cache.
    pub hits: u64,
    /// Dead bucket entries removed during lookups.
    pub dead_discards: u64,
    /// Returned buffers dropped for being below the threshold.
    pub discarded_small: u64,
    /// Cached buffers freed by the budget or by `reclaim`.
    pub evictions: u64,
    /// Buffers currently cached.
    pub cached: usize,
    /// Bucket entries currently listed, live or dead.
    pub bucket_entries: usize,
    /// Bytes currently cached.
    pub retained_bytes: usize,
}

/// A buffer checked out of a [`BufferPool`].
///
/// Returned to its pool on [`release`](Self::release) or drop. If the
/// pool itself has been dropped, the buffer is simply freed.
pub struct PooledBuffer {
    buffer: Option<Box<[u8]>>,
    pool: Weak<PoolInner>,
}

impl PooledBuffer {
    /// The buffer's bytes.
    pub fn as_bytes(&self) -> Result<&[u8], SpectraError> {
        self.buffer
            .as_deref()
            .ok_or(SpectraError::disposed(Resource::PooledBuffer))
    }

    /// The buffer's bytes, mutably.
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8], SpectraError> {
        self.buffer
            .as_deref_mut()
            .ok_or(SpectraError::disposed(Resource::PooledBuffer))
    }

    /// Length in bytes; zero once released.
    pub fn len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.len())
    }

    /// Whether the buffer holds no bytes (always true once released).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer has been returned.
    pub fn is_released(&self) -> bool {
        self.buffer.is_none()
    }

    /// Return the buffer to its pool. Idempotent.
    pub fn release(&mut self) {
        let Some(buffer) = self.buffer.take() else {
            return;
        };
        if let Some(pool) = self.pool.upgrade() {
            pool.give_back(buffer);
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .field("released", &self.is_released())
            .finish()
    }
}

// SAFETY: the boxed slice's address is fixed while the handle holds it,
// and `AlignedArray` keeps the handle (unreleased) for as long as it
// uses the pointer. A released handle reports zero length.
unsafe impl RawStorage for PooledBuffer {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        match self.buffer.as_deref_mut() {
            Some(bytes) => bytes.as_mut_ptr(),
            None => std::ptr::NonNull::dangling().as_ptr(),
        }
    }

    fn len(&self) -> usize {
        PooledBuffer::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(min: usize, budget: usize) -> BufferPool {
        BufferPool::with_config(PoolConfig {
            min_size_to_pool: min,
            max_retained_bytes: budget,
        })
        .unwrap()
    }

    #[test]
    fn small_requests_bypass_cache() {
        let pool = small_pool(1000, 1 << 20);
        let mut big = pool.request(4000);
        big.release();
        assert_eq!(pool.stats().cached, 1);

        let small = pool.request(10);
        assert_eq!(small.len(), 10);
        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.fresh_allocations, 2);
    }

    #[test]
    fn large_request_reuses_larger_buffer() {
        let pool = small_pool(1000, 1 << 20);
        drop(pool.request(5000));
        let reused = pool.request(2000);
        assert_eq!(reused.len(), 5000);
        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fresh_allocations, 1);
    }

    #[test]
    fn too_small_cached_buffer_is_skipped() {
        let pool = small_pool(1000, 1 << 20);
        drop(pool.request(1500));
        let fresh = pool.request(2000);
        assert_eq!(fresh.len(), 2000);
        assert_eq!(pool.stats().hits, 0);
        assert_eq!(pool.stats().cached, 1);
    }

    #[test]
    fn small_returns_are_discarded() {
        let pool = small_pool(1000, 1 << 20);
        drop(pool.request(999));
        let stats = pool.stats();
        assert_eq!(stats.discarded_small, 1);
        assert_eq!(stats.cached, 0);
        assert!(pool.bucket_sizes().is_empty());
    }

    #[test]
    fn buckets_stay_sorted() {
        let pool = small_pool(100, 1 << 20);
        let handles: Vec<_> = [700, 200, 500, 200, 900, 100]
            .iter()
            .map(|&n| pool.request(n))
            .collect();
        drop(handles);
        assert_eq!(pool.bucket_sizes(), vec![100, 200, 200, 500, 700, 900]);
    }

    #[test]
    fn release_is_idempotent() {
        let pool = small_pool(100, 1 << 20);
        let mut buf = pool.request(200);
        buf.release();
        buf.release();
        drop(buf);
        assert_eq!(pool.stats().cached, 1);
        assert_eq!(pool.bucket_sizes(), vec![200]);
    }

    #[test]
    fn released_handle_reports_disposed() {
        let pool = small_pool(100, 1 << 20);
        let mut buf = pool.request(200);
        buf.release();
        assert_eq!(
            buf.as_bytes().unwrap_err(),
            SpectraError::disposed(Resource::PooledBuffer)
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn reclaimed_entries_are_discarded_on_lookup() {
        let pool = small_pool(100, 1 << 20);
        drop(pool.request(300));
        drop(pool.request(400));
        assert_eq!(pool.reclaim(), 2);
        assert_eq!(pool.bucket_sizes(), vec![300, 400]);

        let buf = pool.request(200);
        assert_eq!(buf.len(), 200);
        let stats = pool.stats();
        assert_eq!(stats.dead_discards, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.bucket_entries, 0);
        assert_eq!(stats.fresh_allocations, 3);
    }

    #[test]
    fn budget_evicts_oldest_first() {
        let pool = small_pool(100, 1000);
        let a = pool.request(400);
        let b = pool.request(500);
        let c = pool.request(300);
        drop(a);
        drop(b);
        drop(c);
        let stats = pool.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.retained_bytes, 800);

        // The 400-byte buffer went first; its bucket is dead.
        let buf = pool.request(350);
        assert_eq!(buf.len(), 500);
        assert_eq!(pool.stats().dead_discards, 1);
    }

    #[test]
    fn zero_budget_never_retains() {
        let pool = small_pool(100, 0);
        drop(pool.request(200));
        assert_eq!(pool.stats().cached, 0);
        assert!(pool.bucket_sizes().is_empty());
    }

    #[test]
    fn buffer_outliving_pool_is_freed() {
        let pool = small_pool(100, 1 << 20);
        let buf = pool.request(200);
        drop(pool);
        drop(buf);
    }

    #[test]
    fn threshold_can_be_lowered() {
        let pool = small_pool(1000, 1 << 20);
        drop(pool.request(500));
        assert_eq!(pool.stats().cached, 0);
        pool.set_min_size_to_pool(100);
        drop(pool.request(500));
        assert_eq!(pool.stats().cached, 1);
        assert_eq!(pool.min_size_to_pool(), 100);
    }

    #[test]
    fn dead_entries_are_compacted() {
        let pool = small_pool(10, 1 << 20);
        let handles: Vec<_> = (0..40).map(|_| pool.request(64)).collect();
        for handle in handles {
            drop(handle);
            pool.reclaim();
        }
        // One live entry allows at most 18 listed before compaction.
        assert!(pool.stats().bucket_entries <= 18);
        assert_eq!(pool.stats().cached, 0);
    }
}
