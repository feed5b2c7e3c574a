//! Alignment arithmetic.

use spectra_core::{Element, SpectraError};

/// Offset to add to `address` to reach the next multiple of `alignment`.
///
/// The offset is always in `1..=alignment`: an address that is already
/// aligned is advanced by a full `alignment`. A buffer therefore needs
/// `payload + alignment` bytes to be safe for any base address.
#[inline]
pub fn aligned_offset(address: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    alignment - (address & (alignment - 1))
}

/// Whether `address` is a multiple of `alignment`.
#[inline]
pub fn is_aligned(address: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    address & (alignment - 1) == 0
}

/// Reject alignments that are zero, not a power of two, or weaker than
/// the natural alignment of `T`.
pub fn validate_alignment<T: Element>(alignment: usize) -> Result<(), SpectraError> {
    if !alignment.is_power_of_two() || alignment < std::mem::align_of::<T>() {
        return Err(SpectraError::InvalidAlignment { alignment });
    }
    Ok(())
}

/// Bytes needed to hold `payload` bytes at any base address.
pub fn worst_case_len(payload: usize, alignment: usize) -> Option<usize> {
    payload.checked_add(alignment)
}
