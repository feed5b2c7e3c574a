//! Views over an aligned sub-region of an owned byte buffer.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use spectra_core::{Complex64, Element, Shape, ShapeError, SpectraError};

use crate::align::{aligned_offset, validate_alignment, worst_case_len};
use crate::array::NdArray;
use crate::pool::BufferPool;
use crate::storage::RawStorage;

/// A view that owns a byte buffer and exposes its first
/// `alignment`-aligned region of `len() * size_of::<T>()` bytes.
///
/// The buffer may be allocated by the view, supplied by the caller, or
/// checked out of a [`BufferPool`]; in the last case releasing the view
/// returns the buffer to the pool.
pub struct AlignedArray<T: Element> {
    storage: Option<Box<dyn RawStorage>>,
    ptr: NonNull<T>,
    shape: Shape,
    alignment: usize,
    _marker: PhantomData<T>,
}

/// Aligned view of complex elements.
pub type AlignedArrayComplex = AlignedArray<Complex64>;

/// Aligned view of real elements.
pub type AlignedArrayReal = AlignedArray<f64>;

// SAFETY: the view exclusively owns its storage, which is `Send`. The raw
// pointer only aliases that storage. `NonNull` keeps the view `!Sync`.
unsafe impl<T: Element> Send for AlignedArray<T> {}

impl<T: Element> AlignedArray<T> {
    /// Allocate a zeroed buffer of `payload + alignment` bytes and view
    /// its aligned region with the given extents.
    pub fn new(alignment: usize, extents: &[usize]) -> Result<Self, SpectraError> {
        validate_alignment::<T>(alignment)?;
        let shape = Shape::new(extents)?;
        let total = padded_len::<T>(&shape, alignment)?;
        Self::bind(Box::new(vec![0u8; total].into_boxed_slice()), shape, alignment)
    }

    /// View the aligned region of caller-supplied storage.
    ///
    /// Fails with [`SpectraError::UndersizedBuffer`] if the storage cannot
    /// hold the payload at all, or cannot hold it once advanced to the
    /// aligned address. On failure the storage is dropped before the
    /// error is returned.
    pub fn from_buffer<S>(storage: S, alignment: usize, extents: &[usize]) -> Result<Self, SpectraError>
    where
        S: RawStorage + 'static,
    {
        validate_alignment::<T>(alignment)?;
        let shape = Shape::new(extents)?;
        Self::bind(Box::new(storage), shape, alignment)
    }

    /// Check a scratch buffer out of `pool` and view it.
    ///
    /// The request is sized for the worst-case alignment offset, so it
    /// cannot fail the alignment check.
    pub fn from_pool(pool: &BufferPool, alignment: usize, extents: &[usize]) -> Result<Self, SpectraError> {
        validate_alignment::<T>(alignment)?;
        let shape = Shape::new(extents)?;
        let total = padded_len::<T>(&shape, alignment)?;
        Self::bind(Box::new(pool.request(total)), shape, alignment)
    }

    fn bind(mut storage: Box<dyn RawStorage>, shape: Shape, alignment: usize) -> Result<Self, SpectraError> {
        let payload = shape.byte_len(T::SIZE)?;
        let available = storage.len();
        if payload > available {
            return Err(SpectraError::UndersizedBuffer {
                required: payload,
                available,
            });
        }

        let base = storage.as_mut_ptr();
        let offset = aligned_offset(base as usize, alignment);
        let usable = available.saturating_sub(offset);
        if payload > usable {
            drop(storage);
            return Err(SpectraError::UndersizedBuffer {
                required: payload + offset,
                available,
            });
        }

        // SAFETY: `offset + payload <= available`, so the aligned pointer
        // and the whole payload lie inside the storage. `offset >= 1`, so
        // the pointer is non-null.
        let ptr = unsafe { NonNull::new_unchecked(base.add(offset).cast::<T>()) };
        Ok(Self {
            storage: Some(storage),
            ptr,
            shape,
            alignment,
            _marker: PhantomData,
        })
    }

    /// The alignment the base pointer satisfies.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Length of the underlying buffer in bytes; zero once released.
    pub fn buffer_len(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.len())
    }
}

fn padded_len<T: Element>(shape: &Shape, alignment: usize) -> Result<usize, SpectraError> {
    let payload = shape.byte_len(T::SIZE)?;
    worst_case_len(payload, alignment).ok_or_else(|| {
        ShapeError::Overflow {
            extents: shape.extents().to_vec(),
        }
        .into()
    })
}

// SAFETY: `ptr` is aligned inside `storage`, which holds the payload
// and is owned by the view until `release` drops it.
unsafe impl<T: Element> NdArray<T> for AlignedArray<T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn is_released(&self) -> bool {
        self.storage.is_none()
    }

    fn release(&mut self) {
        self.storage = None;
    }

    fn base_ptr(&self) -> NonNull<T> {
        self.ptr
    }
}

impl<T: Element> fmt::Debug for AlignedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedArray")
            .field("kind", &T::KIND)
            .field("shape", &self.shape.to_string())
            .field("alignment", &self.alignment)
            .field("released", &self.is_released())
            .finish()
    }
}
