//! The closed set of element types a view may hold.
//!
//! Only two kinds exist: real `f64` samples and interleaved complex
//! pairs ([`Complex64`], `#[repr(C)]` re/im). The trait is sealed, so
//! read/write strategies are fixed at compile time and no runtime
//! dispatch is needed on the element path.

use std::fmt;

pub use num_complex::Complex64;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f64 {}
    impl Sealed for super::Complex64 {}
}

/// Runtime tag describing an [`Element`] type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A single `f64`.
    Real,
    /// A `(re, im)` pair of `f64`.
    Complex,
}

impl ElementKind {
    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Real => 8,
            Self::Complex => 16,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// A plain-old-data element that can live in engine-addressable memory.
///
/// Implemented for `f64` and [`Complex64`] only.
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static + sealed::Sealed
{
    /// Runtime tag for this element type.
    const KIND: ElementKind;

    /// Size of one element in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Real;
}

impl Element for Complex64 {
    const KIND: ElementKind = ElementKind::Complex;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_kind() {
        assert_eq!(<f64 as Element>::SIZE, ElementKind::Real.size());
        assert_eq!(<Complex64 as Element>::SIZE, ElementKind::Complex.size());
        assert_eq!(std::mem::align_of::<Complex64>(), 8);
    }

    #[test]
    fn kind_display() {
        assert_eq!(<Complex64 as Element>::KIND.to_string(), "complex");
        assert_eq!(<f64 as Element>::KIND.to_string(), "real");
    }
}
