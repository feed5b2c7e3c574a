//! Storage with a controlled start address.

use spectra_arena::RawStorage;

/// A `len`-byte window whose first byte sits exactly on a multiple of
/// `alignment`.
///
/// An exactly aligned start is the worst case for an aligned array: the
/// alignment offset is then a full `alignment` bytes.
pub struct AlignedWindow {
    bytes: Vec<u8>,
    offset: usize,
    len: usize,
}

impl AlignedWindow {
    /// Panics unless `alignment` is a power of two.
    pub fn new(len: usize, alignment: usize) -> Self {
        assert!(alignment.is_power_of_two(), "alignment must be a power of two");
        let bytes = vec![0u8; len + alignment];
        let address = bytes.as_ptr() as usize;
        let offset = (alignment - address % alignment) % alignment;
        Self { bytes, offset, len }
    }

    /// Address of the window's first byte.
    pub fn address(&self) -> usize {
        self.bytes.as_ptr() as usize + self.offset
    }
}

// SAFETY: the window lies inside the Vec's heap buffer, which never
// reallocates and does not move with the struct.
#[allow(unsafe_code)]
unsafe impl RawStorage for AlignedWindow {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr().wrapping_add(self.offset)
    }

    fn len(&self) -> usize {
        self.len
    }
}
