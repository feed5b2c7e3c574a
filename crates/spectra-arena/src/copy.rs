//! Raw element copies between views.
//!
//! Copies go straight through the base pointers with `ptr::copy`, so
//! source and destination may be the same view or overlap.

use spectra_core::{Element, SpectraError};

use crate::array::NdArray;

/// Copy `count` elements from `src[src_offset..]` to `dst[dst_offset..]`.
///
/// Fails with [`SpectraError::OutOfRange`] if either range runs past the
/// end of its view, and with [`SpectraError::Disposed`] if either view
/// has been released.
pub fn copy_to<T, S, D>(
    src: &S,
    dst: &D,
    src_offset: usize,
    dst_offset: usize,
    count: usize,
) -> Result<(), SpectraError>
where
    T: Element,
    S: NdArray<T> + ?Sized,
    D: NdArray<T> + ?Sized,
{
    let from = src.as_ptr()?;
    let to = dst.as_ptr()?;
    check_range(src_offset, count, src.len())?;
    check_range(dst_offset, count, dst.len())?;
    // SAFETY: both views are live and both ranges were checked against
    // their lengths. `ptr::copy` tolerates overlap.
    unsafe {
        std::ptr::copy(
            from.as_ptr().add(src_offset),
            to.as_ptr().add(dst_offset),
            count,
        );
    }
    Ok(())
}

/// Copy `dst.len()` elements from the start of `src` to the start of
/// `dst`.
pub fn copy_all<T, S, D>(src: &S, dst: &D) -> Result<(), SpectraError>
where
    T: Element,
    S: NdArray<T> + ?Sized,
    D: NdArray<T> + ?Sized,
{
    copy_to(src, dst, 0, 0, dst.len())
}

/// Like [`copy_to`], with both start positions given as multi-indices.
pub fn copy_at<T, S, D>(
    src: &S,
    dst: &D,
    src_index: &[usize],
    dst_index: &[usize],
    count: usize,
) -> Result<(), SpectraError>
where
    T: Element,
    S: NdArray<T> + ?Sized,
    D: NdArray<T> + ?Sized,
{
    src.ensure_live()?;
    dst.ensure_live()?;
    let src_offset = src.shape().offset(src_index)?;
    let dst_offset = dst.shape().offset(dst_index)?;
    copy_to(src, dst, src_offset, dst_offset, count)
}

fn check_range(offset: usize, count: usize, len: usize) -> Result<(), SpectraError> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(SpectraError::OutOfRange { offset, count, len }),
    }
}
