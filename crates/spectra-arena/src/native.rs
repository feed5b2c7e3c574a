//! Views over memory allocated by the transform engine.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use spectra_core::{Complex64, Element, Shape, SpectraError};

use crate::align::is_aligned;
use crate::array::NdArray;

/// The engine's allocator, as seen by [`EngineArray`].
///
/// Engine memory typically carries the engine's preferred SIMD alignment
/// and lives outside the pool and the alignment scheme of
/// [`AlignedArray`](crate::AlignedArray).
pub trait NativeAllocator: Send + Sync {
    /// Allocate `bytes` bytes, or `None` if the engine is out of memory.
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate(bytes)` on this allocator and must
    /// not be used afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>, bytes: usize);
}

/// A view that owns engine-allocated memory and frees it on release.
pub struct EngineArray<T: Element> {
    allocator: Arc<dyn NativeAllocator>,
    ptr: Option<NonNull<T>>,
    shape: Shape,
    bytes: usize,
}

/// Engine-allocated view of complex elements.
pub type EngineArrayComplex = EngineArray<Complex64>;

/// Engine-allocated view of real elements.
pub type EngineArrayReal = EngineArray<f64>;

// SAFETY: the view exclusively owns its allocation and the allocator is
// `Send + Sync`. `NonNull` keeps the view `!Sync`.
unsafe impl<T: Element> Send for EngineArray<T> {}

impl<T: Element> EngineArray<T> {
    /// Allocate zeroed engine memory for `extents`.
    pub fn new(allocator: Arc<dyn NativeAllocator>, extents: &[usize]) -> Result<Self, SpectraError> {
        let shape = Shape::new(extents)?;
        let bytes = shape.byte_len(T::SIZE)?;
        let raw = allocator
            .allocate(bytes)
            .ok_or(SpectraError::AllocationFailed { bytes })?;
        if !is_aligned(raw.as_ptr() as usize, std::mem::align_of::<T>()) {
            // SAFETY: `raw` was just returned by `allocate(bytes)`.
            unsafe { allocator.release(raw, bytes) };
            return Err(SpectraError::AllocationFailed { bytes });
        }
        // SAFETY: the engine handed out `bytes` writable bytes at `raw`.
        unsafe { raw.as_ptr().write_bytes(0, bytes) };
        Ok(Self {
            allocator,
            ptr: Some(raw.cast::<T>()),
            shape,
            bytes,
        })
    }
}

// SAFETY: `ptr` is the engine allocation of `bytes` for `shape.len()`
// elements; it is freed only by `release`, which clears it.
unsafe impl<T: Element> NdArray<T> for EngineArray<T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn is_released(&self) -> bool {
        self.ptr.is_none()
    }

    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` came from `allocate(self.bytes)` and is taken
            // out of the view, so it is released exactly once.
            unsafe { self.allocator.release(ptr.cast::<u8>(), self.bytes) };
        }
    }

    fn base_ptr(&self) -> NonNull<T> {
        self.ptr.unwrap_or(NonNull::dangling())
    }
}

impl<T: Element> Drop for EngineArray<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element> fmt::Debug for EngineArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineArray")
            .field("kind", &T::KIND)
            .field("shape", &self.shape.to_string())
            .field("released", &self.is_released())
            .finish()
    }
}
