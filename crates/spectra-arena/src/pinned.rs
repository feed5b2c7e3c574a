//! Views over borrowed caller memory.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use spectra_core::{Element, Shape, SpectraError};

use crate::array::NdArray;

/// A view that borrows a caller-owned slice for `'a`.
///
/// The slice stays mutably borrowed, and therefore unmovable, until the
/// view is dropped. [`release`](NdArray::release) only unpins: the view
/// stops granting access, but the memory is never freed by it.
pub struct PinnedArray<'a, T: Element> {
    ptr: NonNull<T>,
    shape: Shape,
    pinned: bool,
    _borrow: PhantomData<&'a mut [T]>,
}

// SAFETY: the view is equivalent to `&'a mut [T]`, which is `Send` for
// `T: Send`. `NonNull` keeps it `!Sync`.
unsafe impl<T: Element> Send for PinnedArray<'_, T> {}

impl<'a, T: Element> PinnedArray<'a, T> {
    /// Pin `data` and view it with `extents`.
    ///
    /// `data.len()` must equal the product of the extents.
    pub fn new(data: &'a mut [T], extents: &[usize]) -> Result<Self, SpectraError> {
        let shape = Shape::new(extents)?;
        if data.len() != shape.len() {
            return Err(SpectraError::ShapeMismatch {
                expected: extents.to_vec(),
                found: vec![data.len()],
            });
        }
        Ok(Self {
            ptr: NonNull::from(data).cast::<T>(),
            shape,
            pinned: true,
            _borrow: PhantomData,
        })
    }

    /// Pin `data` as a rank-1 view.
    pub fn from_slice(data: &'a mut [T]) -> Result<Self, SpectraError> {
        let len = data.len();
        Self::new(data, &[len])
    }
}

// SAFETY: `ptr` comes from a `&'a mut [T]` of exactly `shape.len()`
// elements, held for the view's lifetime.
unsafe impl<T: Element> NdArray<T> for PinnedArray<'_, T> {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn is_released(&self) -> bool {
        !self.pinned
    }

    fn release(&mut self) {
        self.pinned = false;
    }

    fn base_ptr(&self) -> NonNull<T> {
        self.ptr
    }
}

impl<T: Element> fmt::Debug for PinnedArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedArray")
            .field("kind", &T::KIND)
            .field("shape", &self.shape.to_string())
            .field("pinned", &self.pinned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_core::{Complex64, Resource};

    #[test]
    fn writes_reach_caller_memory() {
        let mut data = vec![0.0f64; 6];
        {
            let view = PinnedArray::new(&mut data, &[2, 3]).unwrap();
            view.set2(1, 0, 4.5).unwrap();
            view.set(&[0, 2], -1.0).unwrap();
        }
        assert_eq!(data, vec![0.0, 0.0, -1.0, 4.5, 0.0, 0.0]);
    }

    #[test]
    fn length_must_match_extents() {
        let mut data = vec![Complex64::default(); 5];
        let err = PinnedArray::new(&mut data, &[2, 3]).unwrap_err();
        assert_eq!(
            err,
            SpectraError::ShapeMismatch {
                expected: vec![2, 3],
                found: vec![5],
            }
        );
    }

    #[test]
    fn release_unpins_without_freeing() {
        let mut data = vec![1.0f64, 2.0, 3.0];
        {
            let mut view = PinnedArray::from_slice(&mut data).unwrap();
            assert_eq!(view.get1(2).unwrap(), 3.0);
            view.release();
            view.release();
            assert_eq!(
                view.get1(0).unwrap_err(),
                SpectraError::disposed(Resource::View)
            );
        }
        assert_eq!(data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn base_pointer_is_slice_start() {
        let mut data = vec![0.0f64; 4];
        let expected = data.as_ptr();
        let view = PinnedArray::from_slice(&mut data).unwrap();
        assert_eq!(view.as_ptr().unwrap().as_ptr().cast_const(), expected);
    }
}
