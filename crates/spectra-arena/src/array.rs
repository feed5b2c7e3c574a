//! The [`NdArray`] capability shared by every view type.

use std::ptr::NonNull;

use spectra_core::{Element, Resource, Shape, SpectraError};

/// A multi-dimensional, row-major view over engine-addressable memory.
///
/// Implementors supply the shape, the release state, and the base
/// pointer; element access and offset arithmetic are provided on top.
/// Access after [`release`](Self::release) fails with
/// [`SpectraError::Disposed`].
///
/// Element writes take `&self`: the memory behind a view is shared with
/// the transform engine, which reads and writes it through the raw
/// pointer while plans borrow the view. Views are never `Sync`, so
/// writes cannot race.
///
/// # Safety
///
/// The provided methods and the transform engine dereference
/// [`base_ptr`](Self::base_ptr) without further checks. An implementor
/// must guarantee that, for as long as `is_released()` returns `false`:
///
/// - `base_ptr()` is aligned for `T` and valid for reads and writes of
///   `shape().len()` consecutive elements;
/// - the region stays at the same address and is not freed;
/// - the region is not reachable through any other live `&mut`.
///
/// After [`release`](Self::release) returns, `is_released()` must return
/// `true` from then on.
///
/// A safe impl is rejected:
///
/// ```compile_fail
/// use std::ptr::NonNull;
/// use spectra_arena::NdArray;
/// use spectra_core::Shape;
///
/// struct Dangling(Shape);
///
/// impl NdArray<f64> for Dangling {
///     fn shape(&self) -> &Shape { &self.0 }
///     fn is_released(&self) -> bool { false }
///     fn release(&mut self) {}
///     fn base_ptr(&self) -> NonNull<f64> { NonNull::dangling() }
/// }
/// ```
pub unsafe trait NdArray<T: Element> {
    /// The validated extent vector.
    fn shape(&self) -> &Shape;

    /// Whether [`release`](Self::release) has been called.
    fn is_released(&self) -> bool;

    /// Release the backing memory (or unpin borrowed memory).
    ///
    /// Idempotent: calling it again has no effect.
    fn release(&mut self);

    /// Base pointer of element 0, unchecked against release state.
    ///
    /// Only meaningful while `!is_released()`.
    #[doc(hidden)]
    fn base_ptr(&self) -> NonNull<T>;

    /// Base pointer for the engine. Fails after release.
    fn as_ptr(&self) -> Result<NonNull<T>, SpectraError> {
        self.ensure_live()?;
        Ok(self.base_ptr())
    }

    /// Fail with `Disposed` if the view has been released.
    fn ensure_live(&self) -> Result<(), SpectraError> {
        if self.is_released() {
            return Err(SpectraError::disposed(Resource::View));
        }
        Ok(())
    }

    /// Number of axes.
    fn rank(&self) -> usize {
        self.shape().rank()
    }

    /// Extent of every axis.
    fn extents(&self) -> &[usize] {
        self.shape().extents()
    }

    /// Total number of elements.
    fn len(&self) -> usize {
        self.shape().len()
    }

    /// Always `false` for a valid shape.
    fn is_empty(&self) -> bool {
        self.shape().is_empty()
    }

    /// Read the element at a flat row-major offset.
    fn get_flat(&self, offset: usize) -> Result<T, SpectraError> {
        self.ensure_live()?;
        check_flat(offset, self.len())?;
        // SAFETY: the view is live and `offset < len`; the trait contract
        // makes `len` elements valid behind the base pointer.
        Ok(unsafe { self.base_ptr().as_ptr().add(offset).read() })
    }

    /// Write the element at a flat row-major offset.
    fn set_flat(&self, offset: usize, value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        check_flat(offset, self.len())?;
        // SAFETY: as in `get_flat`; views are !Sync, so no other thread
        // can observe this write.
        unsafe { self.base_ptr().as_ptr().add(offset).write(value) };
        Ok(())
    }

    /// Read the element at a multi-index whose length must equal the rank.
    fn get(&self, index: &[usize]) -> Result<T, SpectraError> {
        self.ensure_live()?;
        let offset = self.shape().offset(index)?;
        self.get_flat(offset)
    }

    /// Write the element at a multi-index whose length must equal the rank.
    fn set(&self, index: &[usize], value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        let offset = self.shape().offset(index)?;
        self.set_flat(offset, value)
    }

    /// Rank-1 read.
    fn get1(&self, i0: usize) -> Result<T, SpectraError> {
        self.ensure_live()?;
        self.get_flat(self.shape().offset1(i0)?)
    }

    /// Rank-2 read.
    fn get2(&self, i0: usize, i1: usize) -> Result<T, SpectraError> {
        self.ensure_live()?;
        self.get_flat(self.shape().offset2(i0, i1)?)
    }

    /// Rank-3 read.
    fn get3(&self, i0: usize, i1: usize, i2: usize) -> Result<T, SpectraError> {
        self.ensure_live()?;
        self.get_flat(self.shape().offset3(i0, i1, i2)?)
    }

    /// Rank-1 write.
    fn set1(&self, i0: usize, value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        self.set_flat(self.shape().offset1(i0)?, value)
    }

    /// Rank-2 write.
    fn set2(&self, i0: usize, i1: usize, value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        self.set_flat(self.shape().offset2(i0, i1)?, value)
    }

    /// Rank-3 write.
    fn set3(&self, i0: usize, i1: usize, i2: usize, value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        self.set_flat(self.shape().offset3(i0, i1, i2)?, value)
    }

    /// Copy every element out, row-major.
    fn to_vec(&self) -> Result<Vec<T>, SpectraError> {
        self.ensure_live()?;
        let len = self.len();
        let mut out = Vec::with_capacity(len);
        // SAFETY: live view, `len` elements readable from the base pointer.
        unsafe {
            std::ptr::copy_nonoverlapping(self.base_ptr().as_ptr(), out.as_mut_ptr(), len);
            out.set_len(len);
        }
        Ok(out)
    }

    /// Overwrite the view from a slice of exactly `len()` elements.
    fn fill_from(&self, values: &[T]) -> Result<(), SpectraError> {
        self.ensure_live()?;
        if values.len() != self.len() {
            return Err(SpectraError::ShapeMismatch {
                expected: self.extents().to_vec(),
                found: vec![values.len()],
            });
        }
        // SAFETY: live view of `len` elements and `values` holds exactly
        // `len`; `ptr::copy` tolerates the ranges overlapping.
        unsafe {
            std::ptr::copy(values.as_ptr(), self.base_ptr().as_ptr(), values.len());
        }
        Ok(())
    }

    /// Set every element to `value`.
    fn fill(&self, value: T) -> Result<(), SpectraError> {
        self.ensure_live()?;
        let base = self.base_ptr().as_ptr();
        for offset in 0..self.len() {
            // SAFETY: `offset < len` on a live view.
            unsafe { base.add(offset).write(value) };
        }
        Ok(())
    }
}

fn check_flat(offset: usize, len: usize) -> Result<(), SpectraError> {
    if offset >= len {
        return Err(SpectraError::OutOfRange {
            offset,
            count: 1,
            len,
        });
    }
    Ok(())
}
