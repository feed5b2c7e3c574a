//! Extent vectors and row-major offset arithmetic.
//!
//! A [`Shape`] is an ordered list of positive extents (rank >= 1) whose
//! product is known to fit in `usize`. Offsets are computed row-major,
//! last axis fastest:
//!
//! ```text
//! offset = i[r-1] + n[r-1] * (i[r-2] + n[r-2] * ( ... (i[1] + n[1] * i[0])))
//! ```
//!
//! The fixed-rank helpers ([`Shape::offset1`], [`Shape::offset2`],
//! [`Shape::offset3`]) and the variable-rank fold ([`Shape::offset`])
//! must agree exactly for ranks 1 to 3.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{ShapeError, SpectraError};

/// Inline storage for extents; ranks up to 4 never touch the heap.
pub type Extents = SmallVec<[usize; 4]>;

/// A validated extent vector with its cached element count.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    extents: Extents,
    len: usize,
}

impl Shape {
    /// Validate `extents` and compute the element count with checked
    /// arithmetic.
    pub fn new(extents: &[usize]) -> Result<Self, ShapeError> {
        if extents.is_empty() {
            return Err(ShapeError::Empty);
        }
        let mut len = 1usize;
        for (axis, &n) in extents.iter().enumerate() {
            if n == 0 {
                return Err(ShapeError::ZeroExtent { axis });
            }
            len = len.checked_mul(n).ok_or_else(|| ShapeError::Overflow {
                extents: extents.to_vec(),
            })?;
        }
        Ok(Self {
            extents: SmallVec::from_slice(extents),
            len,
        })
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// The extent of every axis, outermost first.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Extent of a single axis, or `None` if `axis >= rank`.
    pub fn extent(&self, axis: usize) -> Option<usize> {
        self.extents.get(axis).copied()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a valid shape holds at least one element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte size of the payload for elements of `elem_size` bytes.
    ///
    /// Fails if the byte count would exceed `isize::MAX`, the largest
    /// allocation Rust permits.
    pub fn byte_len(&self, elem_size: usize) -> Result<usize, ShapeError> {
        self.len
            .checked_mul(elem_size)
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or_else(|| ShapeError::Overflow {
                extents: self.extents.to_vec(),
            })
    }

    /// Extents of the conjugate-symmetric half spectrum of a real
    /// transform over this shape: the last extent `n` becomes `n / 2 + 1`.
    pub fn complex_extents(&self) -> Shape {
        let mut extents = self.extents.clone();
        let last = extents.len() - 1;
        extents[last] = extents[last] / 2 + 1;
        let len = extents.iter().product();
        Shape { extents, len }
    }

    /// Flat offset of a variable-rank index.
    ///
    /// Fails with [`SpectraError::RankMismatch`] if `index.len()` differs
    /// from the rank, or [`SpectraError::IndexOutOfBounds`] if any
    /// component is not smaller than its extent.
    pub fn offset(&self, index: &[usize]) -> Result<usize, SpectraError> {
        self.verify_rank(index.len())?;
        index
            .iter()
            .zip(self.extents.iter())
            .enumerate()
            .try_fold(0usize, |acc, (axis, (&i, &n))| {
                check_axis(axis, i, n)?;
                Ok(acc * n + i)
            })
    }

    /// Flat offset for a rank-1 shape.
    pub fn offset1(&self, i0: usize) -> Result<usize, SpectraError> {
        self.verify_rank(1)?;
        check_axis(0, i0, self.extents[0])?;
        Ok(i0)
    }

    /// Flat offset for a rank-2 shape.
    pub fn offset2(&self, i0: usize, i1: usize) -> Result<usize, SpectraError> {
        self.verify_rank(2)?;
        check_axis(0, i0, self.extents[0])?;
        check_axis(1, i1, self.extents[1])?;
        Ok(i1 + self.extents[1] * i0)
    }

    /// Flat offset for a rank-3 shape.
    pub fn offset3(&self, i0: usize, i1: usize, i2: usize) -> Result<usize, SpectraError> {
        self.verify_rank(3)?;
        check_axis(0, i0, self.extents[0])?;
        check_axis(1, i1, self.extents[1])?;
        check_axis(2, i2, self.extents[2])?;
        Ok(i2 + self.extents[2] * (i1 + self.extents[1] * i0))
    }

    /// Row-major stride (in elements) of every axis.
    pub fn strides(&self) -> Extents {
        let mut strides: Extents = SmallVec::from_elem(1, self.rank());
        for axis in (0..self.rank().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.extents[axis + 1];
        }
        strides
    }

    fn verify_rank(&self, actual: usize) -> Result<(), SpectraError> {
        if actual != self.rank() {
            return Err(SpectraError::RankMismatch {
                expected: self.rank(),
                actual,
            });
        }
        Ok(())
    }
}

fn check_axis(axis: usize, index: usize, extent: usize) -> Result<(), SpectraError> {
    if index >= extent {
        return Err(SpectraError::IndexOutOfBounds {
            axis,
            index,
            extent,
        });
    }
    Ok(())
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for n in &self.extents {
            if !first {
                write!(f, "x")?;
            }
            write!(f, "{n}")?;
            first = false;
        }
        Ok(())
    }
}
