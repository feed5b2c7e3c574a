//! Integration test: the buffer pool under concurrent request/release.
//!
//! Eight threads check buffers out and return them in a tight loop. The
//! bucket list must stay sorted, every request must be accounted for
//! as either a hit or a fresh allocation, and no buffer may be handed
//! to two holders at once.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;
use spectra_arena::{BufferPool, PoolConfig};

const THREADS: usize = 8;
const ROUNDS: usize = 200;

#[test]
fn concurrent_requests_and_releases() {
    let pool = BufferPool::with_config(PoolConfig {
        min_size_to_pool: 1024,
        max_retained_bytes: 1 << 20,
    })
    .unwrap();
    let held: Arc<Mutex<HashSet<usize>>> = Arc::default();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = pool.clone();
            let held = Arc::clone(&held);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let size = 1024 * (1 + (t + round) % 4);
                    let mut buffer = pool.request(size);
                    assert!(buffer.len() >= size);
                    let address = buffer.as_bytes().unwrap().as_ptr() as usize;
                    assert!(held.lock().insert(address), "buffer handed out twice");
                    buffer.as_bytes_mut().unwrap()[0] = t as u8;
                    assert!(held.lock().remove(&address));
                    buffer.release();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.hits + stats.fresh_allocations, (THREADS * ROUNDS) as u64);
    assert!(stats.hits > 0);
    let sizes = pool.bucket_sizes();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "{sizes:?}");
    assert!(stats.retained_bytes <= 1 << 20);
}

#[test]
fn small_requests_never_touch_the_cache() {
    let pool = BufferPool::with_config(PoolConfig {
        min_size_to_pool: 4096,
        max_retained_bytes: 1 << 20,
    })
    .unwrap();
    drop(pool.request(8192));
    assert_eq!(pool.stats().cached, 1);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    drop(pool.request(100));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.cached, 1);
    assert_eq!(stats.discarded_small, 200);
}
