//! Engine-addressable array views and scratch buffer pooling.
//!
//! Every view type exposes the same [`NdArray`] capability: rank,
//! extents, row-major element access, and a raw base pointer a native
//! transform engine can read and write in place. Three storage variants
//! exist:
//!
//! ```text
//! NdArray<T>
//! ├── AlignedArray<T>  owns a byte buffer (heap, caller-supplied, or pooled)
//! │                    and exposes an aligned sub-region of it
//! ├── PinnedArray<T>   borrows caller memory; release only unpins
//! └── EngineArray<T>   owns memory obtained from a NativeAllocator
//! ```
//!
//! [`BufferPool`] caches large byte buffers between transforms. Cached
//! buffers are held in a generation-checked slot table, so the pool can
//! reclaim them behind the bucket list's back; stale bucket entries are
//! discarded lazily on the next lookup.
//!
//! Raw memory access in the workspace is confined to this crate and to
//! the engine boundary that consumes the views' base pointers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod align;
pub mod aligned;
pub mod array;
pub mod config;
pub mod copy;
pub mod native;
pub mod pinned;
pub mod pool;
mod slots;
pub mod storage;

pub use aligned::{AlignedArray, AlignedArrayComplex, AlignedArrayReal};
pub use array::NdArray;
pub use config::{ConfigError, PoolConfig};
pub use copy::{copy_all, copy_at, copy_to};
pub use native::{EngineArray, EngineArrayComplex, EngineArrayReal, NativeAllocator};
pub use pinned::PinnedArray;
pub use pool::{BufferPool, PoolStats, PooledBuffer};
pub use storage::RawStorage;
